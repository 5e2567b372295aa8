use std::fs;
use std::path::Path;

use quire::commands::generate;
use quire::Site;

const CONFIG: &str = r#"
title: Jo's Notes
description: Writing about compilers.
author: Jo
url: https://example.com
home_posts: 2
"#;

fn write(base: &Path, relative: &str, contents: &str) {
    let path = base.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(base: &Path, relative: &str) -> String {
    fs::read_to_string(base.join(relative))
        .unwrap_or_else(|e| panic!("reading {}: {}", relative, e))
}

fn sample_site(base: &Path) {
    write(base, "_config.yml", CONFIG);
    write(
        base,
        "source/index.md",
        "---\nlayout: home\n---\n\nWelcome in.\n",
    );
    write(
        base,
        "source/blog/index.md",
        "---\nlayout: blog\ntitle: Blog\n---\n\nAll posts.\n",
    );
    write(base, "source/about.md", "---\ntitle: About\n---\n\nHi.\n");
    write(
        base,
        "source/_posts/2021-03-14-lisp.md",
        "---\ntitle: Writing a Lisp\ndate: 2021-03-14\nupdated: 2021-04-01\n---\n\nParens everywhere.\n\n<!--more-->\n\nThe rest.\n",
    );
    write(
        base,
        "source/_posts/2020-01-02-hello.md",
        "---\ntitle: Hello\n---\n\nFirst post.\n",
    );
    write(
        base,
        "source/_posts/2022-06-30-types.md",
        "---\ntitle: Types\ndescription: On type systems\n---\n\nTypes are sets.\n",
    );
    write(base, "source/css/extra.css", "body { color: red; }\n");
    write(base, "source/plain.html", "<p>not a document</p>\n");
}

#[test]
fn test_generate_site() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    sample_site(base);

    let site = Site::new(base).unwrap();
    generate::run(&site).unwrap();
    let public = base.join("public");

    let post = read(&public, "blog/2021/03/14/lisp/index.html");
    assert!(post.contains("<title>Writing a Lisp"));
    assert!(post.contains("<meta name=\"description\" content=\"Parens everywhere.\""));
    assert!(post.contains("class=\"post-updated\""));
    // Older neighbour on the left, newer on the right
    assert!(post.contains("<a class=\"prev\" rel=\"prev\" href=\"/blog/2020/01/02/hello/\">"));
    assert!(post.contains("<a class=\"next\" rel=\"next\" href=\"/blog/2022/06/30/types/\">"));

    let hello = read(&public, "blog/2020/01/02/hello/index.html");
    assert!(!hello.contains("class=\"post-updated\""));
    assert!(!hello.contains("class=\"prev\""));

    let blog = read(&public, "blog/index.html");
    let types = blog.find("/blog/2022/06/30/types/").unwrap();
    let lisp = blog.find("/blog/2021/03/14/lisp/").unwrap();
    let hello = blog.find("/blog/2020/01/02/hello/").unwrap();
    assert!(types < lisp && lisp < hello);
    assert!(blog.contains("<p class=\"meta\">On type systems</p>"));

    let home = read(&public, "index.html");
    assert!(home.contains("/blog/2022/06/30/types/"));
    assert!(home.contains("/blog/2021/03/14/lisp/"));
    assert!(!home.contains("/blog/2020/01/02/hello/"));

    assert!(public.join("about/index.html").exists());
    assert_eq!(read(&public, "css/extra.css"), "body { color: red; }\n");
    assert_eq!(read(&public, "plain.html"), "<p>not a document</p>\n");

    let feed = read(&public, "atom.xml");
    assert!(feed.contains("<title>Jo&apos;s Notes</title>"));
    assert!(feed.contains("<id>https://example.com/blog/2021/03/14/lisp/</id>"));
    assert_eq!(feed.matches("<entry>").count(), 3);
}

#[test]
fn test_bad_front_matter_fails_but_writes_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    sample_site(base);
    write(
        base,
        "source/_posts/2021-05-05-broken.md",
        "---\ntitle: [unclosed\n---\n\nNope.\n",
    );

    let site = Site::new(base).unwrap();
    let err = generate::run(&site).unwrap_err();
    assert!(err.to_string().contains("2021-05-05-broken.md"));

    let public = base.join("public");
    assert!(public.join("blog/2021/03/14/lisp/index.html").exists());
    assert!(public.join("index.html").exists());
    assert!(!public.join("blog/2021/05/05/broken").exists());
}

#[test]
fn test_layout_override() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    sample_site(base);
    write(
        base,
        "_layouts/page.html",
        "{% extends \"layout.html\" %}{% block main %}<div class=\"custom\">{{ content }}</div>{% endblock main %}",
    );

    let site = Site::new(base).unwrap();
    generate::run(&site).unwrap();

    let about = read(&base.join("public"), "about/index.html");
    assert!(about.contains("<div class=\"custom\"><p>Hi.</p>"));
}

#[test]
fn test_regenerate_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    sample_site(base);

    let site = Site::new(base).unwrap();
    generate::run(&site).unwrap();
    let first = read(&base.join("public"), "blog/2021/03/14/lisp/index.html");
    let first_feed = read(&base.join("public"), "atom.xml");

    generate::run(&site).unwrap();
    assert_eq!(first, read(&base.join("public"), "blog/2021/03/14/lisp/index.html"));
    assert_eq!(first_feed, read(&base.join("public"), "atom.xml"));
}

#[test]
fn test_permalink_never_escapes_public_dir() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("site");
    sample_site(&base);
    write(
        &base,
        "source/_posts/2021-02-02-sneaky.md",
        "---\ntitle: Sneaky\npermalink: ../../escaped\n---\n\nBody.\n",
    );

    let site = Site::new(&base).unwrap();
    generate::run(&site).unwrap();

    assert!(!dir.path().join("escaped").exists());
    assert!(base.join("public/escaped/index.html").exists());
}

#[test]
fn test_source_dir_at_site_root() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();
    write(base, "_config.yml", "title: Flat\nsource_dir: .\n");
    write(base, "about.md", "---\ntitle: About\n---\n\nHi.\n");
    write(base, "_layouts/page.html", "{% extends \"layout.html\" %}");
    write(base, "scaffolds/post.md", "---\ntitle: {{ title }}\n---\n");

    let site = Site::new(base).unwrap();
    for _ in 0..3 {
        generate::run(&site).unwrap();
    }

    let public = base.join("public");
    assert!(public.join("about/index.html").exists());
    assert!(!public.join("public").exists());
    assert!(!public.join("_layouts").exists());
    assert!(!public.join("scaffolds").exists());
}

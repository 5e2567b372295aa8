//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG: &str = r#"# Site
title: My Site
description: Notes, essays and the occasional tutorial.
author: John Doe
language: en
timezone: UTC

# URL
url: http://example.com
root: /
permalink: blog/:year/:month/:day/:slug/

# Directory
source_dir: source
public_dir: public
layouts_dir: _layouts

# Writing
date_format: "%B %-d, %Y"
excerpt_separator: <!--more-->
render_drafts: false
highlight:
  enable: true
  theme: InspiredGitHub
  line_number: false

# Home page
home_posts: 5

menu:
  Home: /
  Blog: /blog/
  About: /about/

feed:
  enable: true
  path: atom.xml
  limit: 20
"#;

const HOME: &str = r#"---
layout: home
---

Hi, I'm John. This is where I write things down.
"#;

const BLOG: &str = r#"---
layout: blog
title: Blog
---

Everything I have written, newest first.
"#;

const ABOUT: &str = r#"---
title: About
---

A few words about me.
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    if target_dir.join(CONFIG_FILE).exists() {
        anyhow::bail!("{:?} already contains a {}", target_dir, CONFIG_FILE);
    }

    let source = target_dir.join("source");
    fs::create_dir_all(source.join("_posts"))?;
    fs::create_dir_all(source.join("blog"))?;
    fs::create_dir_all(target_dir.join("_layouts"))?;

    fs::write(target_dir.join(CONFIG_FILE), CONFIG)?;
    fs::write(source.join("index.md"), HOME)?;
    fs::write(source.join("blog/index.md"), BLOG)?;
    fs::write(source.join("about.md"), ABOUT)?;

    let today = chrono::Local::now().date_naive();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
---

This is the first post. Everything above the marker becomes the summary.

<!--more-->

## Writing posts

Create a new post with `quire new "My New Post"`, then run `quire server`
to preview it.
"#,
        today.format("%Y-%m-%d")
    );
    fs::write(
        source
            .join("_posts")
            .join(format!("{}-hello-world.md", today.format("%Y-%m-%d"))),
        sample_post,
    )?;

    Ok(())
}

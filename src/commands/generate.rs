//! Generate static files

use anyhow::Result;
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::{Component, Path};
use std::sync::mpsc::{channel, Receiver};
use std::time::{Duration, Instant};

use crate::content::loader::ContentLoader;
use crate::generator::{GenerateReport, Generator};
use crate::{Site, CONFIG_FILE};

/// Quiet period after the last change before regenerating
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Generate the static site. Fails if any document could not be loaded or
/// rendered; every other page is still written.
pub fn run(site: &Site) -> Result<()> {
    let report = build(site)?;
    if !report.failed.is_empty() {
        anyhow::bail!(
            "{} document(s) failed: {}",
            report.failed.len(),
            report.failed.join(", ")
        );
    }
    Ok(())
}

/// Load, render and write the site, reporting per-document failures
pub fn build(site: &Site) -> Result<GenerateReport> {
    let start = Instant::now();

    let loader = ContentLoader::new(site)?;
    let content = loader.load()?;
    tracing::info!(
        "Loaded {} posts and {} pages",
        content.posts.len(),
        content.pages.len()
    );

    let generator = Generator::new(site)?;
    let mut report = generator.generate(&content)?;

    let mut failed: Vec<String> = content
        .failed
        .iter()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect();
    failed.append(&mut report.failed);
    report.failed = failed;

    tracing::info!(
        "Generated {} pages and copied {} assets in {:.2}s",
        report.pages,
        report.assets,
        start.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Watch for file changes and regenerate until interrupted
pub async fn watch(site: &Site) -> Result<()> {
    let watcher = SiteWatcher::new(site)?;
    tracing::info!("Watching for changes. Press Ctrl+C to stop.");
    tokio::task::spawn_blocking(move || watcher.run(|| {})).await?
}

/// Debounced watcher over the source tree, layouts and config file
pub struct SiteWatcher {
    site: Site,
    rx: Receiver<DebounceEventResult>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl SiteWatcher {
    /// Start watching. Events are buffered until [`SiteWatcher::run`].
    pub fn new(site: &Site) -> Result<Self> {
        let (tx, rx) = channel();
        let mut debouncer = new_debouncer(DEBOUNCE, tx)?;

        let config_path = site.base_dir.join(CONFIG_FILE);
        let watched = [
            (&site.source_dir, RecursiveMode::Recursive),
            (&site.layouts_dir, RecursiveMode::Recursive),
            (&config_path, RecursiveMode::NonRecursive),
        ];
        for (path, mode) in watched {
            if path.exists() {
                debouncer.watcher().watch(path, mode)?;
                tracing::debug!("Watching: {:?}", path);
            }
        }

        Ok(Self {
            site: site.clone(),
            rx,
            _debouncer: debouncer,
        })
    }

    /// Regenerate after every quiet period that follows a relevant change,
    /// calling `on_rebuild` after each successful run. Blocks until the
    /// watcher shuts down.
    pub fn run<F: FnMut()>(self, mut on_rebuild: F) -> Result<()> {
        for result in self.rx.iter() {
            let events = match result {
                Ok(events) => events,
                Err(e) => {
                    tracing::error!("Watch error: {:?}", e);
                    continue;
                }
            };

            let changed: Vec<_> = events
                .iter()
                .filter(|e| is_relevant(&e.path, &self.site.public_dir))
                .collect();
            if changed.is_empty() {
                continue;
            }
            for event in &changed {
                tracing::info!("File changed: {}", event.path.display());
            }

            match rebuild(&self.site) {
                Ok(()) => {
                    tracing::info!("Regenerated");
                    on_rebuild();
                }
                Err(e) => tracing::error!("Generation failed: {:#}", e),
            }
        }

        Ok(())
    }
}

/// Changes under the public directory, VCS metadata and editor droppings
/// don't trigger a rebuild
fn is_relevant(path: &Path, public_dir: &Path) -> bool {
    if path.starts_with(public_dir) {
        return false;
    }
    let ignored = path.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name == ".git" || name == "node_modules" || name == ".DS_Store"
        }
        _ => false,
    });
    let backup = path
        .file_name()
        .map(|n| n.to_string_lossy().ends_with('~'))
        .unwrap_or(false);
    !ignored && !backup
}

/// Regenerate, picking up configuration changes
pub fn rebuild(site: &Site) -> Result<()> {
    let fresh = Site::new(&site.base_dir)?;
    run(&fresh)
}

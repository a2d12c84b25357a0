use crate::config::Config;
use crate::markdown::{page, render_markdown};
use crate::render::Renderer;
use crate::theme::ThemeManager;
use anyhow::{Context, Result};
use notify::{EventKind, RecursiveMode, Watcher};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info};

pub struct RenderJob {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    /// Emit only the body instead of a standalone page.
    pub fragment: bool,
}

pub fn run_app(job: RenderJob, config: Config, watch: bool) -> Result<()> {
    let theme_manager = ThemeManager::load(&config)?;
    let renderer = Renderer::new(&config, &theme_manager)?;
    debug!(modes = ?renderer.modes().collect::<Vec<_>>(), "renderer ready");
    render_once(&job, &renderer)?;
    if watch {
        watch_input(&job, &renderer)?;
    }
    Ok(())
}

fn watch_input(job: &RenderJob, renderer: &Renderer) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let _ = tx.send(res);
    })?;
    watcher
        .watch(&job.input, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", job.input.display()))?;
    info!("watching {}", job.input.display());

    let debounce = Duration::from_millis(50);
    while let Ok(msg) = rx.recv() {
        let mut changed = is_change(&msg);
        // Editors often save in several steps; fold them into one render.
        while let Ok(next) = rx.recv_timeout(debounce) {
            changed |= is_change(&next);
        }
        if !changed {
            continue;
        }
        if let Err(err) = render_once(job, renderer) {
            error!("render failed: {err:#}");
        }
    }
    Ok(())
}

fn is_change(msg: &notify::Result<notify::Event>) -> bool {
    match msg {
        Ok(event) => matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any
        ),
        Err(err) => {
            error!("watch error: {err}");
            false
        }
    }
}

fn render_once(job: &RenderJob, renderer: &Renderer) -> Result<()> {
    let input = fs::read_to_string(&job.input)
        .with_context(|| format!("Failed to read {}", job.input.display()))?;
    let body = render_markdown(&input, renderer)?;
    let html = if job.fragment {
        body
    } else {
        page(&page_title(&job.input), &body)
    };

    match &job.output {
        Some(path) => {
            fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(html.as_bytes())
                .context("Failed to write to stdout")?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn page_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("code")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{page_title, render_once, RenderJob};
    use crate::render::tests::{renderer, test_config};
    use std::fs;
    use std::path::Path;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{prefix}-{now}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn renders_file_to_page() {
        let dir = temp_dir("pretty-code-app");
        let input = dir.join("notes.md");
        let output = dir.join("notes.html");
        fs::write(&input, "```rust {1}\nlet a = 1;\n```\n").expect("write input");

        let job = RenderJob {
            input,
            output: Some(output.clone()),
            fragment: false,
        };
        render_once(&job, &renderer(&test_config())).expect("render");

        let html = fs::read_to_string(&output).expect("read output");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>notes</title>"));
        assert!(html.contains("data-highlighted-line=\"\""));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_input_is_an_error() {
        let job = RenderJob {
            input: Path::new("/definitely/not/here.md").to_path_buf(),
            output: None,
            fragment: true,
        };
        let err = render_once(&job, &renderer(&test_config())).expect_err("missing file");
        assert!(format!("{err:#}").contains("Failed to read"));
    }

    #[test]
    fn title_comes_from_file_stem() {
        assert_eq!(page_title(Path::new("docs/guide.md")), "guide");
        assert_eq!(page_title(Path::new("/")), "code");
    }
}

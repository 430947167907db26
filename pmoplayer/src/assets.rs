//! Routes for the widget's build output
//!
//! The host site serves the compiled bundle from the build directory: every
//! `.js` file under `js/`, every `.css` file under `css/`. The snippets
//! injected in the host pages reference those routes.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use pmoconfig::MusicConfig;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

/// Stylesheet of the widget
pub const STYLESHEET_ROUTE: &str = "/css/style.css";

/// Script bundle of the widget
pub const SCRIPT_ROUTE: &str = "/js/music-player.iife.js";

/// A build file exposed under a site-relative route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRoute {
    /// Site-relative path, e.g. `js/music-player.iife.js`
    pub route: String,
    pub path: PathBuf,
    pub content_type: &'static str,
}

impl AssetRoute {
    /// Opens the file as a byte stream
    pub async fn open(&self) -> std::io::Result<ReaderStream<File>> {
        let file = File::open(&self.path).await?;
        Ok(ReaderStream::new(file))
    }
}

/// Lists the `.js` and `.css` files of `dist_dir`, sorted by route
///
/// A missing or unreadable directory gives an empty list.
pub fn collect_routes(dist_dir: &Path) -> Vec<AssetRoute> {
    let entries = match std::fs::read_dir(dist_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dist_dir.display(), error = %e, "No build directory");
            return Vec::new();
        }
    };

    let mut routes: Vec<AssetRoute> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_str()?.to_string();
            let (dir, content_type) = match path.extension()?.to_str()? {
                "js" => ("js", "text/javascript; charset=utf-8"),
                "css" => ("css", "text/css; charset=utf-8"),
                _ => return None,
            };
            Some(AssetRoute {
                route: format!("{dir}/{name}"),
                path,
                content_type,
            })
        })
        .collect();

    routes.sort_by(|a, b| a.route.cmp(&b.route));
    routes
}

/// Router serving every route with its content type
pub fn router(routes: Vec<AssetRoute>) -> Router {
    routes.into_iter().fold(Router::new(), |router, asset| {
        let path = format!("/{}", asset.route);
        router.route(
            &path,
            get(move || {
                let asset = asset.clone();
                async move { serve(asset).await }
            }),
        )
    })
}

async fn serve(asset: AssetRoute) -> Response {
    match asset.open().await {
        Ok(stream) => (
            [(header::CONTENT_TYPE, asset.content_type)],
            Body::from_stream(stream),
        )
            .into_response(),
        Err(e) => {
            warn!(path = %asset.path.display(), error = %e, "Cannot open asset");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Tag injected before `</head>`
pub fn head_snippet() -> String {
    format!(r#"<link rel="stylesheet" href="{STYLESHEET_ROUTE}">"#)
}

/// Tags injected before `</body>`: the configuration, then the bundle
pub fn body_snippet(config: &MusicConfig) -> serde_json::Result<String> {
    // "</" would close the script element early
    let json = serde_json::to_string(config)?.replace("</", "<\\/");
    Ok(format!(
        "<script>window.HEXO_MUSIC_CONFIG = {json};</script>\n<script src=\"{SCRIPT_ROUTE}\"></script>"
    ))
}

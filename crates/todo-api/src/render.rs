use handlebars::Handlebars;
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Template(#[from] handlebars::RenderError),
}

/// トップページのレンダラ
///
/// テンプレートはリクエストごとにディスクから読み直すので、
/// 起動中に `static/home.tpl` を編集しても反映される。
#[derive(Debug)]
pub struct PageRenderer {
    registry: Handlebars<'static>,
    template_path: PathBuf,
}

impl PageRenderer {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            registry: Handlebars::new(),
            template_path: template_path.into(),
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub async fn render_home(&self) -> Result<String, RenderError> {
        let source = tokio::fs::read_to_string(&self.template_path)
            .await
            .map_err(|source| RenderError::Read {
                path: self.template_path.clone(),
                source,
            })?;

        let page = self
            .registry
            .render_template(&source, &json!({ "title": "Todo" }))?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn template_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_renders_template_with_page_data() {
        let file = template_file("<title>{{title}}</title>");
        let renderer = PageRenderer::new(file.path());

        let page = renderer.render_home().await.unwrap();

        assert_eq!(page, "<title>Todo</title>");
    }

    #[tokio::test]
    async fn test_missing_template_is_a_read_error() {
        let renderer = PageRenderer::new("does/not/exist.tpl");

        let err = renderer.render_home().await.unwrap_err();

        assert!(matches!(err, RenderError::Read { .. }));
        assert!(err.to_string().contains("does/not/exist.tpl"));
    }

    #[tokio::test]
    async fn test_malformed_template_is_a_template_error() {
        let file = template_file("{{#each items}}unclosed");
        let renderer = PageRenderer::new(file.path());

        let err = renderer.render_home().await.unwrap_err();

        assert!(matches!(err, RenderError::Template(_)));
    }

    #[tokio::test]
    async fn test_bundled_home_template_renders() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../static/home.tpl");
        let renderer = PageRenderer::new(path);

        let page = renderer.render_home().await.unwrap();

        assert!(page.contains("<html"));
    }
}

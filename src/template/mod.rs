use anyhow::{bail, Result};

use crate::{
    catalog::ApiDescriptor,
    engine::{build_request_url, RunOptions},
};

mod js_fetch;

pub fn render_export_template(
    name: &str,
    descriptor: &ApiDescriptor,
    options: &RunOptions,
    proxy_base: &str,
) -> Result<String> {
    let url = build_request_url(descriptor, options, proxy_base);
    match name {
        "js-fetch" => Ok(js_fetch::render_js_fetch(descriptor, &url)),
        other => bail!("Unknown export template: {other}"),
    }
}

/// The catalog's own snippet when it has one, otherwise a generated js-fetch call.
pub fn code_snippet(descriptor: &ApiDescriptor) -> String {
    match &descriptor.code_snippet {
        Some(snippet) => snippet.clone(),
        None => js_fetch::render_js_fetch(descriptor, &descriptor.endpoint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DEFAULT_PROXY_BASE;

    fn descriptor() -> ApiDescriptor {
        ApiDescriptor::new("fact", "https://api.example.com/fact?x=1")
    }

    #[test]
    fn render_js_fetch_uses_augmented_url() -> Result<()> {
        let options = RunOptions {
            credential: Some("abc".to_string()),
            ..RunOptions::default()
        };
        let rendered = render_export_template(
            "js-fetch",
            &descriptor(),
            &options,
            DEFAULT_PROXY_BASE,
        )?;

        assert!(rendered.contains("await fetch(\"https://api.example.com/fact?x=1&appid=abc"));
        assert!(rendered.contains("method: \"GET\""));
        assert!(rendered.contains("\"Accept\": \"application/json\""));
        Ok(())
    }

    #[test]
    fn render_js_fetch_wraps_proxy() -> Result<()> {
        let options = RunOptions {
            proxy_enabled: true,
            ..RunOptions::default()
        };
        let rendered = render_export_template(
            "js-fetch",
            &descriptor(),
            &options,
            DEFAULT_PROXY_BASE,
        )?;
        assert!(rendered.contains("https://api.allorigins.win/raw?url=https%3A%2F%2F"));
        Ok(())
    }

    #[test]
    fn code_snippet_prefers_catalog_text() {
        let mut described = descriptor();
        assert!(code_snippet(&described).contains("fetch("));
        described.code_snippet = Some("curl https://api.example.com".to_string());
        assert_eq!(code_snippet(&described), "curl https://api.example.com");
    }

    #[test]
    fn render_export_template_rejects_unknown_templates() {
        let err = render_export_template(
            "unknown",
            &descriptor(),
            &RunOptions::default(),
            DEFAULT_PROXY_BASE,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Unknown export template"));
    }
}

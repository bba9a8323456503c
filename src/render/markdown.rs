use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};

use crate::notebook::{NotebookContent, PageImage};

use super::text::tidy_recognized_text;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Tidy recognized handwriting into Markdown before embedding it
    pub format_recognized_text: bool,
}

/// Render notebook content as one Markdown document
pub fn render(content: &NotebookContent) -> String {
    render_with(content, &RenderOptions::default())
}

/// Render with options. Output depends only on `content` and `options`.
pub fn render_with(content: &NotebookContent, options: &RenderOptions) -> String {
    let metadata = &content.metadata;
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", metadata.title));

    output.push_str("## Metadata\n");
    output.push_str(&format!(
        "- Last Modified: {}\n",
        format_timestamp(metadata.modification_time)
    ));
    output.push_str(&format!("- Total Pages: {}\n\n", metadata.total_pages));

    output.push_str("## Pages\n");

    for page in &content.pages {
        output.push('\n');
        output.push_str(&render_page(page, options));
    }

    output
}

fn render_page(page: &PageImage, options: &RenderOptions) -> String {
    let mut section = format!("### Page {}\n", page.number);

    if let Some(text) = page.recognized_text.as_deref().map(str::trim) {
        if !text.is_empty() {
            let text = if options.format_recognized_text {
                tidy_recognized_text(text)
            } else {
                text.to_string()
            };
            section.push_str(&text);
            section.push_str("\n\n");
        }
    }

    section.push_str(&format!(
        "![Page {}](data:{};base64,{})\n",
        page.number,
        page.mime_type(),
        BASE64.encode(&page.bytes)
    ));
    section
}

/// Epoch seconds as `YYYY-MM-DD HH:MM:SS UTC`
fn format_timestamp(epoch_seconds: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_seconds, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{fake_png, MetadataSource, NotebookMetadata};

    fn page(number: u32, bytes: Vec<u8>, text: Option<&str>) -> PageImage {
        PageImage {
            number,
            entry_path: format!("page_{}.png", number),
            bytes,
            recognized_text: text.map(str::to_string),
        }
    }

    fn content(pages: Vec<PageImage>) -> NotebookContent {
        NotebookContent {
            metadata: NotebookMetadata {
                title: "Meeting Notes".to_string(),
                total_pages: pages.len() as u32,
                current_page: 1,
                modification_time: 1_700_000_000,
            },
            metadata_source: MetadataSource::Archive("metadata.json".to_string()),
            pages,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_render_layout() {
        let png = fake_png(1);
        let markdown = render(&content(vec![page(1, png.clone(), None)]));

        let expected = format!(
            "# Meeting Notes\n\n## Metadata\n- Last Modified: 2023-11-14 22:13:20 UTC\n- Total Pages: 1\n\n## Pages\n\n### Page 1\n![Page 1](data:image/png;base64,{})\n",
            BASE64.encode(&png)
        );
        assert_eq!(markdown, expected);
    }

    #[test]
    fn test_render_is_deterministic() {
        let notebook = content(vec![page(1, fake_png(1), None), page(2, fake_png(2), None)]);
        assert_eq!(render(&notebook), render(&notebook));
    }

    #[test]
    fn test_pages_in_order_with_sniffed_mime() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        let markdown = render(&content(vec![page(1, fake_png(1), None), page(2, jpeg, None)]));

        let first = markdown.find("### Page 1").unwrap();
        let second = markdown.find("### Page 2").unwrap();
        assert!(first < second);
        assert!(markdown.contains("![Page 2](data:image/jpeg;base64,"));
    }

    #[test]
    fn test_recognized_text_sits_above_image() {
        let notebook = content(vec![page(1, fake_png(1), Some("todo|owner\nhttps://example.com"))]);

        let plain = render(&notebook);
        assert!(plain.contains("### Page 1\ntodo|owner\nhttps://example.com\n\n![Page 1]"));

        let tidy = render_with(&notebook, &RenderOptions { format_recognized_text: true });
        assert!(tidy.contains("todo | owner\n[https://example.com](https://example.com)\n\n![Page 1]"));
    }

    #[test]
    fn test_empty_notebook_has_no_page_sections() {
        let markdown = render(&content(Vec::new()));
        assert!(markdown.ends_with("## Pages\n"));
        assert!(!markdown.contains("### Page"));
    }
}

//! Attachment and asset strategies.

use parley_core::attachment::{FileKind, classify};
use parley_core::mime;
use parley_types::{Asset, Attachment, JsonMap};
use serde_json::Value;

use crate::node::{FileCard, ImageNode, NodeKind};

const ATTACHMENT_IMAGE_WIDTH: &str = "250px";
const DEFAULT_IMAGE_WIDTH: &str = "500px";
const DEFAULT_IMAGE_HEIGHT: &str = "auto";
const INLINE_PDF_PREFIX: &str = "data:application/pdf;base64,";

/// A user attachment: inline image, or a "View <file>" link.
pub fn render_attachment(attachment: &Attachment) -> NodeKind {
    if classify(&attachment.file_name) == FileKind::Image {
        return NodeKind::Image(ImageNode {
            src: attachment.file.clone(),
            alt: attachment.file_name.clone(),
            description: None,
            width: ATTACHMENT_IMAGE_WIDTH.to_string(),
            height: DEFAULT_IMAGE_HEIGHT.to_string(),
            style: JsonMap::new(),
        });
    }

    NodeKind::Link {
        href: attachment.file.clone(),
        label: format!("View {}", attachment.file_name),
    }
}

/// An assistant-generated file.
pub fn render_asset(asset: &Asset) -> NodeKind {
    let Some(source) = asset.source() else {
        return NodeKind::Error {
            message: format!("Error: Missing file source for {}", asset.file_name),
        };
    };

    match classify(&asset.file_name) {
        FileKind::Image => NodeKind::Image(ImageNode {
            src: source.to_string(),
            alt: asset.file_name.clone(),
            description: asset.description.clone(),
            width: css_length(asset.width.as_ref()).unwrap_or_else(|| DEFAULT_IMAGE_WIDTH.into()),
            height: css_length(asset.height.as_ref())
                .unwrap_or_else(|| DEFAULT_IMAGE_HEIGHT.into()),
            style: asset.style.clone().unwrap_or_default(),
        }),
        FileKind::Document => {
            let extension = mime::extension(&asset.file_name).unwrap_or_default();
            NodeKind::FileCard(FileCard {
                href: source.to_string(),
                file_name: asset.file_name.clone(),
                label: document_label(&extension),
                inline_pdf: extension == "pdf" && source.starts_with(INLINE_PDF_PREFIX),
                extension,
                description: asset.description.clone(),
            })
        }
        FileKind::Other => NodeKind::FileCard(FileCard {
            href: source.to_string(),
            file_name: asset.file_name.clone(),
            extension: "file".to_string(),
            label: document_label("file"),
            description: Some(
                asset
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "Unsupported file generated.".to_string()),
            ),
            inline_pdf: false,
        }),
    }
}

fn document_label(extension: &str) -> &'static str {
    match extension {
        "pdf" => "PDF Document",
        "docx" | "doc" => "Word Document",
        "xlsx" | "xls" => "Spreadsheet File",
        "txt" | "csv" => "Text File",
        _ => "Generated File",
    }
}

/// Hosts send sizes as CSS strings or bare pixel numbers.
fn css_length(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(format!("{n}px")),
        _ => None,
    }
}

// src/utils/certificate.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lopdf::{
    Document, Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use uuid::Uuid;

use crate::{error::AppResult, utils::storage::FileStorage};

/// A4 landscape, in points.
const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;

/// Everything printed on a completion certificate.
#[derive(Debug, Clone)]
pub struct CertificateData {
    pub username: String,
    pub course_title: String,
    pub instructor: String,
    pub completion_date: DateTime<Utc>,
    pub user_id: Uuid,
    pub course_id: Uuid,
}

impl CertificateData {
    /// Deterministic storage key. Re-issuing overwrites the previous file.
    pub fn storage_key(&self) -> String {
        format!(
            "certificates/certificate-{}-{}.pdf",
            self.user_id, self.course_id
        )
    }
}

#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    /// Renders and stores a certificate, returning its public URL.
    async fn issue(&self, data: &CertificateData) -> AppResult<String>;
}

/// Renders certificates as PDF and hands them to a `FileStorage`.
pub struct PdfCertificateIssuer {
    files: Arc<dyn FileStorage>,
}

impl PdfCertificateIssuer {
    pub fn new(files: Arc<dyn FileStorage>) -> Self {
        Self { files }
    }
}

#[async_trait]
impl CertificateIssuer for PdfCertificateIssuer {
    async fn issue(&self, data: &CertificateData) -> AppResult<String> {
        let bytes = render_certificate(data)?;
        let url = self
            .files
            .put(&data.storage_key(), bytes, Some("application/pdf"))
            .await?;

        tracing::info!(
            "Issued certificate for user {} on course {}",
            data.user_id,
            data.course_id
        );
        Ok(url)
    }
}

/// Rough Helvetica advance width, good enough to center a line.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

fn centered_line(ops: &mut Vec<Operation>, font: &str, size: f32, y: f32, text: &str) {
    let x = ((PAGE_WIDTH - text_width(text, size)) / 2.0).max(40.0);
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
    ops.push(Operation::new("ET", vec![]));
}

fn fill_color(ops: &mut Vec<Operation>, r: f32, g: f32, b: f32) {
    ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
}

/// Builds a single-page PDF certificate in memory.
pub fn render_certificate(data: &CertificateData) -> AppResult<Vec<u8>> {
    let mut ops = Vec::new();

    // Border
    ops.push(Operation::new("w", vec![3.0_f32.into()]));
    ops.push(Operation::new("RG", vec![0.15_f32.into(), 0.3_f32.into(), 0.55_f32.into()]));
    ops.push(Operation::new(
        "re",
        vec![
            30.0_f32.into(),
            30.0_f32.into(),
            (PAGE_WIDTH - 60.0).into(),
            (PAGE_HEIGHT - 60.0).into(),
        ],
    ));
    ops.push(Operation::new("S", vec![]));

    fill_color(&mut ops, 0.15, 0.3, 0.55);
    centered_line(&mut ops, "F2", 40.0, 460.0, "Certificate of Completion");

    fill_color(&mut ops, 0.2, 0.2, 0.2);
    centered_line(&mut ops, "F1", 16.0, 400.0, "This certifies that");
    centered_line(&mut ops, "F2", 30.0, 350.0, &data.username);
    centered_line(&mut ops, "F1", 16.0, 300.0, "has successfully completed the course");
    centered_line(&mut ops, "F2", 24.0, 255.0, &data.course_title);
    centered_line(
        &mut ops,
        "F1",
        14.0,
        215.0,
        &format!("Instructor: {}", data.instructor),
    );

    fill_color(&mut ops, 0.4, 0.4, 0.4);
    centered_line(
        &mut ops,
        "F1",
        12.0,
        120.0,
        &format!(
            "Completed on {}",
            data.completion_date.format("%-d %B %Y")
        ),
    );

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let content = Content { operations: ops };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

type FixtureResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Builds a text-only PDF with one page per entry, one text line per string.
fn build_report(pages: &[Vec<&str>]) -> FixtureResult<Document> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::with_capacity(pages.len());
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![40.into(), 800.into()]),
        ];
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

pub fn write_report_pdf(path: &Path, pages: &[Vec<&str>]) -> FixtureResult<()> {
    build_report(pages)?.save(path)?;
    Ok(())
}

pub fn report_pdf_bytes(pages: &[Vec<&str>]) -> FixtureResult<Vec<u8>> {
    let mut bytes = Vec::new();
    build_report(pages)?.save_to(&mut bytes)?;
    Ok(bytes)
}

/// A daily signal report: a title, the issue date, and the forecast table.
pub fn signal_report_lines() -> Vec<&'static str> {
    vec![
        "Daily signal report.",
        "Issued 2025/10/03.",
        "Item  Prev  Forecast  Market",
        "Notes  500  1,200  900",
        "Fiscal  -1,000  -26,000  -20,000",
    ]
}

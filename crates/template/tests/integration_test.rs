//! Integration tests for template rendering

use chrono::NaiveDate;
use lopdf::{dictionary, Object};
use pdf_core::{PageSpec, PdfDocument};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;
use template::{
    import_template, parse_template, FillEngine, FixedClock, PageCompositor, RenderMode, Strategy,
    Template,
};

const INVOICE_JSON: &str = r#"{
    "name": "Invoice",
    "pageWidth": 612,
    "pageHeight": 792,
    "fields": [
        { "name": "total", "type": "number", "x": 100, "y": 200, "width": 150, "height": 20 }
    ]
}"#;

fn clock() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap(),
    )
}

fn engine() -> FillEngine {
    FillEngine::new().with_clock(clock())
}

fn page_text(pdf: &[u8]) -> String {
    let doc = PdfDocument::open_from_bytes(pdf).unwrap();
    String::from_utf8_lossy(&doc.page_content(1).unwrap()).into_owned()
}

/// Write a background PDF to a unique temp file
fn temp_pdf(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("pdfill-{}-{name}.pdf", std::process::id()));
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Background page with a printed caption and, optionally, a fillable
/// `total` field on the first page
fn background(with_form: bool) -> Vec<u8> {
    let mut doc = PdfDocument::single_page(&PageSpec::new(612.0, 792.0), &[]).unwrap();
    let page_id = doc.first_page_id().unwrap();
    let inner = doc.inner_mut();

    let caption = inner.add_object(lopdf::Stream::new(
        dictionary! {},
        b"BT /F9 10 Tf 40 740 Td (ACME Corp) Tj ET".to_vec(),
    ));
    let font = inner.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });
    {
        let page = inner.get_object_mut(page_id).unwrap().as_dict_mut().unwrap();
        page.set("Contents", vec![Object::Reference(caption)]);
        page.set("Resources", dictionary! { "Font" => dictionary! { "F9" => font } });
    }

    if with_form {
        let widget = inner.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("total"),
            "DA" => Object::string_literal("/Helv 12 Tf 0 g"),
            "Rect" => vec![100.into(), 572.into(), 250.into(), 592.into()],
        });
        inner
            .get_object_mut(page_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Annots", vec![Object::Reference(widget)]);
        let form = inner.add_object(dictionary! { "Fields" => vec![Object::Reference(widget)] });
        let root = inner.trailer.get(b"Root").unwrap().as_reference().unwrap();
        inner
            .get_object_mut(root)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("AcroForm", form);
    }

    doc.to_bytes().unwrap()
}

#[test]
fn test_end_to_end_invoice_without_background() {
    let template = parse_template(INVOICE_JSON).unwrap();
    let rendered = engine()
        .render(&template, &json!({ "total": "42.50" }), None)
        .unwrap();
    assert_eq!(rendered.strategy, Strategy::Standalone);

    let doc = PdfDocument::open_from_bytes(&rendered.bytes).unwrap();
    assert_eq!(doc.page_count(), 1);

    // Value baseline: box bottom 572, plus height / 2, minus fontSize / 3
    let content = page_text(&rendered.bytes);
    assert!(content.contains("(42.50) Tj"));
    assert!(content.contains("105 578 Td"));
    assert!(content.contains("100 572 150 20 re"));
}

#[test]
fn test_missing_background_matches_direct_standalone() {
    let template = parse_template(INVOICE_JSON).unwrap();
    let data = json!({ "total": "42.50" });
    let missing = std::env::temp_dir().join("pdfill-does-not-exist.pdf");

    let rendered = engine().render(&template, &data, Some(missing.as_path())).unwrap();
    assert_eq!(rendered.strategy, Strategy::Standalone);

    let clock = clock();
    let direct = PageCompositor::new(&template)
        .with_clock(&clock)
        .composite(&data, RenderMode::Standalone)
        .unwrap();
    assert_eq!(rendered.bytes, direct);
}

#[test]
fn test_overlay_merge_on_plain_background() {
    let template = parse_template(INVOICE_JSON).unwrap();
    let path = temp_pdf("plain", &background(false));

    let rendered = engine()
        .render(&template, &json!({ "total": "42.50" }), Some(path.as_path()))
        .unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(rendered.strategy, Strategy::PrimaryMerge);
    let content = page_text(&rendered.bytes);
    let caption = content.find("(ACME Corp) Tj").unwrap();
    let value = content.find("(42.50) Tj").unwrap();
    assert!(caption < value);
    assert!(!content.contains("total:"));
}

#[test]
fn test_template_background_path_is_used() {
    let path = temp_pdf("template-path", &background(false));
    let mut template = parse_template(INVOICE_JSON).unwrap();
    template.background_path = Some(path.to_string_lossy().into_owned());

    let rendered = engine()
        .render(&template, &json!({ "total": "1.00" }), None)
        .unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(rendered.strategy, Strategy::PrimaryMerge);
}

#[test]
fn test_native_fill_on_fillable_background() {
    let template = parse_template(INVOICE_JSON).unwrap();
    let rendered = engine()
        .render_with_background(
            &template,
            &json!({ "total": "42.50" }),
            Some(background(true).as_slice()),
        )
        .unwrap();
    assert_eq!(rendered.strategy, Strategy::NativeFill);

    let doc = PdfDocument::open_from_bytes(&rendered.bytes).unwrap();
    assert!(doc.has_form());
    assert_eq!(doc.form_fields().unwrap()[0].value.as_deref(), Some("42.50"));
}

#[test]
fn test_unmatched_fillable_background_is_merged_and_flattened() {
    let template: Template = serde_json::from_value(json!({
        "name": "Other",
        "fields": [
            { "name": "amount", "type": "text", "x": 10, "y": 10, "width": 100, "height": 20 }
        ]
    }))
    .unwrap();

    let rendered = engine()
        .render_with_background(
            &template,
            &json!({ "amount": "7" }),
            Some(background(true).as_slice()),
        )
        .unwrap();
    assert_eq!(rendered.strategy, Strategy::PrimaryMerge);

    let mut doc = PdfDocument::open_from_bytes(&rendered.bytes).unwrap();
    assert_eq!(doc.page_count(), 1);
    assert!(!doc.has_form());
    assert_eq!(doc.strip_widgets().unwrap(), 0);
}

#[test]
fn test_native_fill_output_is_single_page() {
    let mut doc = PdfDocument::open_from_bytes(&background(true)).unwrap();
    let inner = doc.inner_mut();
    let root = inner.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let pages_id = inner
        .get_object(root)
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"Pages")
        .unwrap()
        .as_reference()
        .unwrap();
    let second = inner.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    let pages = inner.get_object_mut(pages_id).unwrap().as_dict_mut().unwrap();
    pages
        .get_mut(b"Kids")
        .unwrap()
        .as_array_mut()
        .unwrap()
        .push(Object::Reference(second));
    pages.set("Count", 2);
    let two_pages = doc.to_bytes().unwrap();

    let template = parse_template(INVOICE_JSON).unwrap();
    let rendered = engine()
        .render_with_background(
            &template,
            &json!({ "total": "42.50" }),
            Some(two_pages.as_slice()),
        )
        .unwrap();
    assert_eq!(rendered.strategy, Strategy::NativeFill);
    assert_eq!(PdfDocument::open_from_bytes(&rendered.bytes).unwrap().page_count(), 1);
}

#[test]
fn test_oversized_table_renders_standalone() {
    let template = parse_template(
        r#"{
            "name": "Huge",
            "fields": [{
                "name": "items", "type": "table", "x": 50, "y": 300, "width": 300, "height": 75,
                "tableRows": 18446744073709551615, "tableColumns": 3,
                "tableHeaders": ["Item", "Qty", "Price"]
            }]
        }"#,
    )
    .unwrap();

    let rendered = engine()
        .render(&template, &json!({ "items": [["Pen", "2", "1.50"]] }), None)
        .unwrap();
    assert_eq!(rendered.strategy, Strategy::Standalone);
    assert!(page_text(&rendered.bytes).contains("(Pen) Tj"));
}

#[test]
fn test_render_is_idempotent() {
    let template = parse_template(INVOICE_JSON).unwrap();
    let data = json!({ "total": "42.50" });
    let background = background(false);

    let first = engine()
        .render_with_background(&template, &data, Some(background.as_slice()))
        .unwrap();
    let second = engine()
        .render_with_background(&template, &data, Some(background.as_slice()))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_table_rows_as_lists_and_objects() {
    let template: Template = serde_json::from_value(json!({
        "name": "Order",
        "fields": [{
            "name": "items", "type": "table", "x": 50, "y": 300, "width": 300, "height": 75,
            "tableRows": 2, "tableColumns": 3, "tableHeaders": ["Item", "Qty", "Price"]
        }]
    }))
    .unwrap();
    let compositor = PageCompositor::new(&template);

    let as_lists = compositor.draw_ops(
        &json!({ "items": [["Pen", "2", "1.50"], ["Ink", "1", "4.00"]] }),
        RenderMode::OverlayTransparent,
    );
    let as_objects = compositor.draw_ops(
        &json!({ "items": [
            { "Item": "Pen", "Qty": "2", "Price": "1.50" },
            { "Item": "Ink", "Qty": "1", "Price": "4.00" }
        ] }),
        RenderMode::OverlayTransparent,
    );
    assert_eq!(as_lists, as_objects);
    assert_eq!(as_lists.len(), 6);
}

#[test]
fn test_import_then_render() {
    let template = import_template(&background(true)).unwrap();
    assert_eq!(template.fields.len(), 1);
    assert_eq!(template.fields[0].name, "total");
    assert_eq!(template.fields[0].y, 200.0);

    let rendered = engine()
        .render_with_background(
            &template,
            &json!({ "total": "9.99" }),
            Some(background(true).as_slice()),
        )
        .unwrap();
    assert_eq!(rendered.strategy, Strategy::NativeFill);
}

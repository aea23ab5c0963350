use docweave::ooxml::opc::OpcPackage;
use docweave::ooxml::opc::constants::relationship_type as rt;
use docweave::ooxml::xlsx::XlsxReader;
use docweave::{
    AppendData, AppendOptions, CellValue, DirectoryWalker, DocxWriter, ErrorKind, Extractor,
    SheetPayload, StyleConfig, WorkbookOptions, XlsxWriter,
};
use serde_json::json;
use std::fs;
use std::path::Path;

const PML_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const PML_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

fn write_deck(path: &Path, slides: &[&str]) {
    let mut pkg = OpcPackage::new();
    pkg.rels_mut().add(rt::OFFICE_DOCUMENT, "ppt/presentation.xml");

    let mut ids = String::new();
    let mut rels = docweave::ooxml::opc::Relationships::new();
    for (i, _) in slides.iter().enumerate() {
        let r_id = rels.add(rt::SLIDE, &format!("slides/slide{}.xml", i + 1));
        ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, r_id));
    }
    let presentation = format!(
        r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"#
    );
    pkg.add_part("ppt/presentation.xml", PML_PRESENTATION, presentation.into_bytes())
        .rels = rels;

    for (i, text) in slides.iter().enumerate() {
        let slide = format!(
            r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        );
        pkg.add_part(format!("ppt/slides/slide{}.xml", i + 1), PML_SLIDE, slide.into_bytes());
    }
    pkg.save(path).unwrap();
}

fn grid(path: &Path, sheet: usize) -> Vec<Vec<CellValue>> {
    XlsxReader::open(path).unwrap().read_grid(sheet).unwrap()
}

#[test]
fn markup_survives_docx_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("notes.docx");
    let markup = "=== Title ===\n- item one\n- item two\n**bold** plain";

    let message = DocxWriter::new()
        .create_document(markup, &dest, None, &StyleConfig::default())
        .unwrap();
    assert!(message.ends_with(&dest.display().to_string()));

    let doc = Extractor::new().extract(&dest).unwrap();
    // paragraph lines keep their joining space
    assert_eq!(doc.text, "Title\nitem one\nitem two\nbold plain ");
}

#[test]
fn walker_reports_every_supported_file() {
    let dir = tempfile::tempdir().unwrap();
    DocxWriter::new()
        .create_document("Hello\n\nWorld", dir.path().join("a.docx"), None, &StyleConfig::default())
        .unwrap();
    fs::write(dir.path().join("b.txt"), "ignored").unwrap();

    let walker = DirectoryWalker::new();
    let files = walker.list_files(dir.path(), false).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "a.docx");

    let text = walker.extract_all(dir.path(), false).unwrap();
    assert!(text.starts_with("=== a.docx ===\n"));
    assert!(text.contains("Type: Word Document\nContent:\nHello \nWorld \n"));
    assert!(!text.contains("b.txt"));
}

#[test]
fn deck_slides_are_numbered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("deck.pptx");
    write_deck(&path, &["Welcome", "Agenda"]);

    let doc = Extractor::new().extract(&path).unwrap();
    assert_eq!(doc.text, "--- Slide 1 ---\nWelcome\n\n--- Slide 2 ---\nAgenda\n");
}

#[test]
fn workbook_summary_lists_columns_and_types() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("sales.xlsx");
    let sheets = SheetPayload::sheets_from_json(&json!({
        "Sales": [{"region": "north", "units": 3}, {"region": "south", "units": 5}],
        "Blank": []
    }))
    .unwrap();
    XlsxWriter::new()
        .create_workbook(&sheets, &dest, &WorkbookOptions::default())
        .unwrap();

    let text = Extractor::new().extract(&dest).unwrap().text;
    assert!(text.starts_with("Excel Workbook: sales.xlsx\nNumber of sheets: 2\n"));
    assert!(text.contains("=== Sheet: Sales ===\nDimensions: 2 rows x 2 columns"));
    assert!(text.contains("\nColumns:\nregion, units"));
    assert!(text.contains("units: int64 (2/2 non-null)"));
    assert!(text.contains("=== Sheet: Blank ===\nDimensions: 0 rows x 0 columns\nSheet is empty"));
}

#[test]
fn workbook_generation_is_repeatable() {
    let dir = tempfile::tempdir().unwrap();
    let sheets = SheetPayload::sheets_from_json(&json!({"Data": [[1, "a"], [2.5, true]]})).unwrap();
    let writer = XlsxWriter::new();
    let first = dir.path().join("one.xlsx");
    let second = dir.path().join("two.xlsx");
    writer.create_workbook(&sheets, &first, &WorkbookOptions::default()).unwrap();
    writer.create_workbook(&sheets, &second, &WorkbookOptions::default()).unwrap();

    assert_eq!(grid(&first, 0), grid(&second, 0));
    assert_eq!(
        grid(&first, 0),
        vec![
            vec![CellValue::Int(1), CellValue::from("a")],
            vec![CellValue::Float(2.5), CellValue::Bool(true)],
        ]
    );
}

#[test]
fn appends_land_below_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("log.xlsx");
    let writer = XlsxWriter::new();
    let options = AppendOptions::default();

    let first = AppendData::from_json(&json!([["r1", 1]])).unwrap();
    let second = AppendData::from_json(&json!([["r2", 2]])).unwrap();
    writer.append_to_workbook(&dest, "Log", &first, &options).unwrap();
    let message = writer.append_to_workbook(&dest, "Log", &second, &options).unwrap();
    assert!(message.contains("sheet 'Log'"));

    assert_eq!(
        grid(&dest, 0),
        vec![
            vec![CellValue::from("r1"), CellValue::Int(1)],
            vec![CellValue::from("r2"), CellValue::Int(2)],
        ]
    );
}

#[test]
fn bad_paths_are_classified() {
    let dir = tempfile::tempdir().unwrap();
    let extractor = Extractor::new();

    let missing = extractor.extract(dir.path().join("nope.docx")).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
    assert!(missing.to_string().starts_with("Error: File not found - "));

    let not_file = extractor.extract(dir.path()).unwrap_err();
    assert_eq!(not_file.kind(), ErrorKind::NotAFile);

    let text = dir.path().join("plain.txt");
    fs::write(&text, "x").unwrap();
    assert_eq!(extractor.extract(&text).unwrap_err().kind(), ErrorKind::Unsupported);
}

use print_quote_wasm::{
    Binding, ColorMode, DocumentInput, DocumentKind, EstimateMethod, EstimateOptions, HeuristicCounter,
    PageCounter, PaperSize, PaperType, PricingTable, PrintConfiguration, QuoteError, quote_order,
};
use rust_decimal::Decimal;

fn config(paper_size: PaperSize, paper_type: PaperType, color: ColorMode, binding: Binding, copies: u32) -> PrintConfiguration {
    PrintConfiguration {
        paper_size,
        paper_type,
        color,
        binding,
        copies,
    }
}

#[test]
fn every_supported_kind_estimates_at_least_one_page() {
    let counter = HeuristicCounter::default();
    let samples: [(&str, &[u8]); 6] = [
        ("empty.pdf", b""),
        ("zero.pdf", b"/Count 0"),
        ("empty.docx", b""),
        ("tiny.png", b"\x89PNG"),
        ("photo.jpeg", b""),
        ("archive.zip", b"PK"),
    ];
    for (name, bytes) in samples {
        let est = counter.estimate(&DocumentInput::new(name, None, bytes));
        assert!(est.page_count >= 1, "{} estimated {}", name, est.page_count);
    }
}

#[test]
fn mixed_batch_is_priced_as_one_order() {
    let pdf = b"1 0 obj << /Type /Catalog /Pages 3 0 R << /Type /Pages /Count 7 >> >> endobj".to_vec();
    let docx = br#"<w:br w:type="page"/><w:br w:type="page"/><w:sectPr>"#.to_vec();
    let image = vec![0xffu8; 2 * 1024 * 1024];
    let files = [
        DocumentInput::new("chapter.pdf", Some("application/pdf"), &pdf),
        DocumentInput::new("essay.docx", None, &docx),
        DocumentInput::new("cover.jpg", Some("image/jpeg"), &image),
    ];

    let cfg = config(PaperSize::Letter, PaperType::Bond, ColorMode::BlackAndWhite, Binding::Spiral, 5);
    let result = quote_order(&files, &cfg, &EstimateOptions::default(), &PricingTable::default()).unwrap();

    let kinds: Vec<DocumentKind> = result.files.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![DocumentKind::Pdf, DocumentKind::Docx, DocumentKind::Image]);
    assert_eq!(result.files[0].method, EstimateMethod::PagesCount);
    assert_eq!(result.files[1].method, EstimateMethod::BreakMarkers);

    // (7 + 4 + 1) pages x 5 copies
    assert_eq!(result.quote.total_pages, 60);
    // 60 x 3 base + 60 x 5 bond + 60 spiral
    assert_eq!(result.quote.breakdown.base_cost, Decimal::from(180));
    assert_eq!(result.quote.breakdown.paper_type_cost, Decimal::from(300));
    assert_eq!(result.quote.breakdown.binding_cost, Decimal::from(60));
    assert_eq!(result.quote.total_amount, Decimal::from(540));
}

#[test]
fn same_bytes_same_quote() {
    let bytes = b"<< /Type /Page /Parent 2 0 R >>".repeat(3);
    let files = [DocumentInput::new("slides.pdf", None, &bytes)];
    let cfg = config(PaperSize::A4, PaperType::Matte, ColorMode::Color, Binding::Hardcover, 1);
    let first = quote_order(&files, &cfg, &EstimateOptions::default(), &PricingTable::default()).unwrap();
    let second = quote_order(&files, &cfg, &EstimateOptions::default(), &PricingTable::default()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.files[0].page_count, 3);
    // 3 x 10 + 3 x 40 + 50
    assert_eq!(first.quote.total_amount, Decimal::from(200));
}

#[test]
fn zero_copies_is_rejected() {
    let files = [DocumentInput::new("a.pdf", None, b"/Count 2")];
    let cfg = config(PaperSize::A4, PaperType::Normal, ColorMode::Color, Binding::None, 0);
    let err = quote_order(&files, &cfg, &EstimateOptions::default(), &PricingTable::default()).unwrap_err();
    assert!(matches!(err, QuoteError::Validation(_)));
}

use super::extract::{Section, extract_fields, truncate_chars};

const WELL_FORMED: &str = "\
## Recommendation
Set up a PT PMA with KBLI 56101 for the restaurant.

## Timeline
Roughly 2-3 months from deed to operating licence.

## Cost
Minimum paid-up capital of IDR 10 billion.

## Requirements
- Notarial deed
- NIB via OSS
- Tax registration (NPWP)

## Risks
Zoning in Canggu can block a food-service licence.
";

#[test]
fn test_markdown_headers() {
    let fields = extract_fields(WELL_FORMED);

    assert_eq!(
        fields.recommendation.as_deref(),
        Some("Set up a PT PMA with KBLI 56101 for the restaurant.")
    );
    assert_eq!(
        fields.timeline.as_deref(),
        Some("Roughly 2-3 months from deed to operating licence.")
    );
    assert_eq!(
        fields.cost.as_deref(),
        Some("Minimum paid-up capital of IDR 10 billion.")
    );
    assert!(fields.requirements.as_deref().unwrap().contains("NIB via OSS"));
    assert!(fields.risks.as_deref().unwrap().starts_with("Zoning"));
    assert_eq!(fields.found_count(), 5);
}

#[test]
fn test_bold_inline_headers() {
    let text = "**Recommendation:** Use a local nominee-free structure.\n\
                **Timeline**: 6 weeks\n\
                **Costs:** about IDR 25 million in notary fees";

    let fields = extract_fields(text);

    assert_eq!(
        fields.recommendation.as_deref(),
        Some("Use a local nominee-free structure.")
    );
    assert_eq!(fields.timeline.as_deref(), Some("6 weeks"));
    assert_eq!(
        fields.cost.as_deref(),
        Some("about IDR 25 million in notary fees")
    );
    assert_eq!(fields.requirements, None);
    assert_eq!(fields.risks, None);
}

#[test]
fn test_plain_colon_and_numbered_headers() {
    let text = "1. Timeline: two weeks\n2) Risks: visa overstay fines";

    let fields = extract_fields(text);

    assert_eq!(fields.timeline.as_deref(), Some("two weeks"));
    assert_eq!(fields.risks.as_deref(), Some("visa overstay fines"));
}

#[test]
fn test_missing_sections_are_none() {
    let fields = extract_fields("You will need a KITAS sponsored by your company.");

    assert!(fields.is_empty());
    for section in Section::ALL {
        assert_eq!(fields.get(section), None, "{}", section.title());
    }
}

#[test]
fn test_sentence_starting_with_section_word_is_not_a_header() {
    let text = "Timeline depends on the notary.\nRisks are low overall.";

    assert!(extract_fields(text).is_empty());
}

#[test]
fn test_empty_section_body_is_none() {
    let text = "## Cost\n\n## Risks\nCurrency exposure.";

    let fields = extract_fields(text);

    assert_eq!(fields.cost, None);
    assert_eq!(fields.risks.as_deref(), Some("Currency exposure."));
}

#[test]
fn test_first_occurrence_wins() {
    let text = "Risks: first\nTimeline: soon\nRisks: second";

    let fields = extract_fields(text);

    assert_eq!(fields.risks.as_deref(), Some("first"));
}

#[test]
fn test_word_boundary_on_section_name() {
    let text = "## Costing notes\nnot a cost section";

    assert_eq!(extract_fields(text).cost, None);
}

#[test]
fn test_section_body_is_capped() {
    let long = "x".repeat(5_000);
    let text = format!("Recommendation:\n{long}");

    let fields = extract_fields(&text);

    assert_eq!(
        fields.recommendation.map(|r| r.chars().count()),
        Some(crate::constants::MAX_SECTION_CHARS)
    );
}

#[test]
fn test_truncate_chars_respects_char_boundaries() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("abc", 10), "abc");
}

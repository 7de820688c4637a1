//! Bundled registry and document contract

use campaign_model::{BlockCapability, BlockRegistry, CampaignConfig, FieldKind};

#[test]
fn test_builtin_registry_is_complete() {
    let registry = BlockRegistry::builtin();
    assert!(!registry.is_empty());
    assert!(registry.version() > 0);

    for def in registry.definitions() {
        // every field has a default of the right broad shape
        for field in def.props.iter().chain(def.styles.iter()) {
            match &field.kind {
                FieldKind::Select { options } => {
                    let default = field.default_value.as_str().unwrap_or_default();
                    assert!(options.iter().any(|o| o == default), "{}.{}", def.block_type, field.key);
                }
                FieldKind::Toggle => assert!(field.default_value.is_boolean()),
                _ => {}
            }
        }
        assert_eq!(def.default_props().len(), def.props.len());
    }
}

#[test]
fn test_unknown_block_degrades() {
    let registry = BlockRegistry::builtin();

    let capability = registry.capability("RetiredCarousel");
    assert!(matches!(capability, BlockCapability::Unknown("RetiredCarousel")));
    assert!(capability.definition().is_none());
    assert_eq!(capability.label(), "Unknown block");
}

#[test]
fn test_stored_document_with_unknown_type_loads() -> anyhow::Result<()> {
    let source = r##"{
        "id": "7b0c8f9e-3f7a-4a55-9d0e-4f3b8f1d2c11",
        "name": "Legacy",
        "theme": { "globalFont": "Inter", "globalColors": { "primary": "#000000" } },
        "blocks": [
            { "id": "hero1-1", "type": "Hero1", "props": { "title": "Old" } },
            { "id": "old-1", "type": "RetiredCarousel", "props": { "slides": [] } }
        ]
    }"##;

    let doc = CampaignConfig::from_json(source)?;
    doc.validate()?;

    let registry = BlockRegistry::builtin();
    let kinds: Vec<bool> = doc
        .blocks
        .iter()
        .map(|b| registry.capability(&b.block_type).is_known())
        .collect();
    assert_eq!(kinds, vec![true, false]);

    let round_trip = CampaignConfig::from_json(&doc.to_json()?)?;
    assert_eq!(round_trip, doc);
    Ok(())
}

//! Loading promotion rule files into strategies.

use std::{io::Write, path::PathBuf, sync::Arc};

use tempfile::NamedTempFile;

use greengrocer::{prelude::*, rules};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name)
}

fn rule_file(suffix: &str, contents: &str) -> anyhow::Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile()?;

    file.write_all(contents.as_bytes())?;

    Ok(file)
}

fn names(strategies: &[Arc<dyn DiscountStrategy>]) -> Vec<String> {
    strategies.iter().map(|strategy| strategy.name()).collect()
}

#[test]
fn loads_yaml_fixture_in_file_order() -> anyhow::Result<()> {
    let strategies = rules::load_file(
        fixture("promotions.yaml"),
        &PromotionFactories::with_defaults(),
    )?;

    assert_eq!(
        names(&strategies),
        [
            "combo-bananas-2-apples-1-for-1.10-max-5",
            "subtotal-5.00-20-pct-off-cap-0.80"
        ]
    );
    assert!(strategies.iter().all(|strategy| strategy.is_basket_level()));

    Ok(())
}

#[test]
fn loads_json_fixture_with_numeric_params() -> anyhow::Result<()> {
    let strategies = rules::load_file(
        fixture("promotions.json"),
        &PromotionFactories::with_defaults(),
    )?;

    assert_eq!(names(&strategies), ["lemons-b3g1", "peaches-2-for-1.20"]);

    let engine = CheckoutEngine::from_strategies(Arc::new(StaticCatalog), &strategies);

    let mut basket = Basket::new();

    basket.push(ItemType::Lemons, 8)?.push(ItemType::Peaches, 3)?;

    let receipt = engine.checkout(&basket)?;

    let discounts: Vec<(&str, Money)> = receipt
        .discounts()
        .iter()
        .map(|line| (line.description(), line.amount()))
        .collect();

    // Two groups of 3+1 lemons, one pair of peaches at £1.20 instead of £1.50.
    assert_eq!(
        discounts,
        [
            ("Buy 3 Get 1 Free (LEMONS)", Money::from_minor(-50)),
            ("2 PEACHES for £1.20", Money::from_minor(-30)),
        ]
    );

    Ok(())
}

#[test]
fn configured_rule_matches_code_built_strategy() -> anyhow::Result<()> {
    let file = rule_file(
        ".yaml",
        "promotions:\n  - ruleType: MIN_QTY_FIXED_UNIT_PRICE\n    itemType: apple\n    params: { minQty: \"3\", unitPrice: \"0.55\" }\n",
    )?;

    let configured = rules::load_file(file.path(), &PromotionFactories::with_defaults())?;
    let built: Vec<Arc<dyn DiscountStrategy>> = vec![Arc::new(MinQtyUnitPrice::new(
        ItemType::Apples,
        3,
        Money::from_minor(55),
    )?)];

    let mut basket = Basket::new();

    basket.push(ItemType::Apples, 5)?;

    let configured = CheckoutEngine::from_strategies(Arc::new(StaticCatalog), &configured);
    let built = CheckoutEngine::from_strategies(Arc::new(StaticCatalog), &built);

    assert_eq!(configured.checkout(&basket)?, built.checkout(&basket)?);

    Ok(())
}

#[test]
fn blank_file_yields_no_promotions() -> anyhow::Result<()> {
    let file = rule_file(".yaml", "\n")?;

    assert!(rules::load_file(file.path(), &PromotionFactories::with_defaults())?.is_empty());

    Ok(())
}

#[test]
fn unknown_rule_type_fails() -> anyhow::Result<()> {
    let file = rule_file(
        ".yaml",
        "promotions:\n  - ruleType: HALF_PRICE_TUESDAY\n    itemType: BANANAS\n",
    )?;

    let result = rules::load_file(file.path(), &PromotionFactories::with_defaults());

    assert!(matches!(
        result,
        Err(RuleError::UnknownRuleType(ref tag)) if tag == "HALF_PRICE_TUESDAY"
    ));

    Ok(())
}

#[test]
fn missing_param_names_key_and_rule_type() -> anyhow::Result<()> {
    let file = rule_file(
        ".json",
        r#"{"promotions": [{"ruleType": "BUY_X_GET_Y_FREE", "itemType": "BANANAS", "params": {"x": "2"}}]}"#,
    )?;

    let error = rules::load_file(file.path(), &PromotionFactories::with_defaults()).err();

    assert_eq!(
        error.map(|error| error.to_string()).as_deref(),
        Some("Missing param 'y' for ruleType: BUY_X_GET_Y_FREE")
    );

    Ok(())
}

#[test]
fn one_malformed_rule_rejects_the_whole_file() -> anyhow::Result<()> {
    let file = rule_file(
        ".yaml",
        r#"
promotions:
  - ruleType: K_FOR_FIXED_PRICE
    itemType: ORANGES
    params: { k: "3", price: "0.75" }
  - ruleType: MAX_SUBTOTAL_PERCENT_OFF
    params: { threshold: "5.00", percent: "120" }
"#,
    )?;

    let result = rules::load_file(file.path(), &PromotionFactories::with_defaults());

    assert!(matches!(
        result,
        Err(RuleError::Promotion(PromotionError::InvalidParameter { .. }))
    ));

    Ok(())
}

#[test]
fn unparsable_value_fails() -> anyhow::Result<()> {
    let file = rule_file(
        ".yaml",
        "promotions:\n  - ruleType: K_FOR_FIXED_PRICE\n    itemType: ORANGES\n    params: { k: three, price: \"0.75\" }\n",
    )?;

    let result = rules::load_file(file.path(), &PromotionFactories::with_defaults());

    assert!(matches!(
        result,
        Err(RuleError::InvalidValue { key: "k", .. })
    ));

    Ok(())
}

#[test]
fn missing_file_fails() {
    let result = rules::load_file(
        fixture("no-such-promotions.yaml"),
        &PromotionFactories::with_defaults(),
    );

    assert!(matches!(result, Err(RuleError::Io(_))));
}

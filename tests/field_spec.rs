use flightplot::data::field::{message_types, parse_fields, Axis, FieldSpec};

#[test]
fn label_is_split_from_expression() {
    let f = FieldSpec::parse("GPS.Alt<Altitude (m)>");
    assert_eq!(f.expression, "GPS.Alt");
    assert_eq!(f.label.as_deref(), Some("Altitude (m)"));

    let plain = FieldSpec::parse("GPS.Alt");
    assert_eq!(plain.label, None);
    assert_eq!(plain.axis, Axis::Primary);
    assert!(!plain.first_only);
}

#[test]
fn axis_and_first_only_suffixes() {
    let a = FieldSpec::parse("ATT.Roll:2");
    assert_eq!(a.expression, "ATT.Roll");
    assert!(a.is_secondary());
    assert!(!a.first_only);

    let b = FieldSpec::parse("ATT.Pitch:1");
    assert_eq!(b.expression, "ATT.Pitch");
    assert_eq!(b.axis, Axis::Primary);
    assert!(b.first_only);
}

#[test]
fn simple_fast_path_classification() {
    let s = FieldSpec::parse("ATT.Roll");
    assert_eq!(s.simple, Some(("ATT".to_string(), "Roll".to_string())));
    assert!(FieldSpec::parse("ATT.Roll * 2").simple.is_none());
    assert!(FieldSpec::parse("GPS[0].Alt").simple.is_none());
}

#[test]
fn subscriptions_cover_every_field() {
    let fields = parse_fields(&["ATT.Roll", "GPS[1].Alt + BARO.Alt", "degrees(RATE.R)"]);
    let types = message_types(&fields);
    for t in ["ATT", "GPS", "BARO", "RATE"] {
        assert!(types.contains(t), "missing {t}");
    }
    let inst = fields[1].instance_values("GPS").expect("instance map");
    assert!(inst.contains("1"));
    assert!(fields[1].instance_values("BARO").is_none());
}

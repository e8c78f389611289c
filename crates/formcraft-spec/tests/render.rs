use serde_json::{Value, json};

use formcraft_spec::render::{Content, Control};
use formcraft_spec::{
    AnswerSet, FieldPath, FormSession, FormSpec, Intent, RenderOptions, render_card,
    render_document_text, render_edit, render_edit_text, render_print_html, render_static,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "intake_form" => include_str!("../tests/fixtures/intake_form.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn intake() -> FormSpec {
    FormSpec::from_json(fixture("intake_form")).expect("fixture parses")
}

fn filled() -> AnswerSet {
    AnswerSet::from_value(json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "age": 36,
        "referral": "Other",
        "referral_other": "Newsletter",
        "contact": "Email",
        "symptoms": ["Cough", "Fever"],
        "symptom_notes": "Since Monday",
        "dependents": [
            { "name": "Byron", "relation": "Child", "allergies": [{ "allergen": "Nuts", "severe": true }] },
            { "name": "Ann", "relation": "Partner", "allergies": [{ "allergen": "hidden" }] }
        ],
        "insurance_card": { "name": "card.png", "ref": "blob:42" },
        "consent": true
    }))
}

#[test]
fn edit_and_view_show_the_same_fields_and_values() {
    let spec = intake();
    for answers in [AnswerSet::new(), filled()] {
        let form = render_edit(&spec.fields, &answers);
        let doc = render_static(&spec.fields, &answers, &RenderOptions::default());
        assert_eq!(form.visible_paths(), doc.visible_paths());
        assert_eq!(form.displayed_values(), doc.displayed_values());
    }
}

#[test]
fn filled_values_are_displayed_literally() {
    let spec = intake();
    let doc = render_static(&spec.fields, &filled(), &RenderOptions::default());
    let values = doc.displayed_values();
    let shown = |path: &str| values.get(path).map(String::as_str);

    assert_eq!(shown("age"), Some("36"));
    assert_eq!(shown("symptoms"), Some("Fever, Cough"));
    assert_eq!(shown("consent"), Some("Yes"));
    assert_eq!(shown("insurance_card"), Some("card.png"));
    assert_eq!(shown("dependents[0].allergies[0].severe"), Some("Yes"));
    assert_eq!(shown("dependents[1].allergies[0].allergen"), None);
}

#[test]
fn unknown_type_is_skipped_and_its_neighbours_render() {
    let spec = intake();
    let form = render_edit(&spec.fields, &AnswerSet::new());
    let paths = form.visible_paths();
    assert!(!paths.contains(&"signature".to_string()));
    assert!(paths.contains(&"insurance_card".to_string()));
    assert!(paths.contains(&"consent".to_string()));
}

#[test]
fn hidden_fields_appear_only_when_their_rule_holds() {
    let spec = intake();
    let paths = render_edit(&spec.fields, &AnswerSet::new()).visible_paths();
    assert!(!paths.contains(&"referral_other".to_string()));
    assert!(!paths.contains(&"symptom_notes".to_string()));

    let paths = render_edit(&spec.fields, &filled()).visible_paths();
    assert!(paths.contains(&"referral_other".to_string()));
    assert!(paths.contains(&"symptom_notes".to_string()));
    assert!(paths.contains(&"dependents[0].allergies".to_string()));
    assert!(!paths.contains(&"dependents[1].allergies".to_string()));
}

#[test]
fn layout_is_stable_across_renders() {
    let spec = intake();
    let answers = filled();
    let first = render_edit(&spec.fields, &answers);
    let second = render_edit(&spec.fields, &answers);
    assert_eq!(first, second);

    let spans = first
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|cell| cell.placement.span).collect::<Vec<_>>())
        .collect::<Vec<_>>();
    assert_eq!(spans[0], vec![12]);
    assert_eq!(spans[1], vec![6, 6]);
    assert_eq!(spans[2], vec![6, 3, 3]);
    assert!(first.rows[3].cells[0].placement.start_row);

    let doc_a = render_static(&spec.fields, &answers, &RenderOptions::default());
    let doc_b = render_static(&spec.fields, &answers, &RenderOptions::default());
    assert_eq!(doc_a, doc_b);
}

#[test]
fn select_reveals_text_and_typing_reaches_the_host() {
    let spec = FormSpec::from_value(json!([
        { "id": "a", "type": "select", "options": ["X", "Y"] },
        { "id": "b", "type": "text", "visibleIf": ["a", "eq", "X"] }
    ]))
    .unwrap();
    let mut session = FormSession::new(spec);
    assert_eq!(session.render_edit().visible_paths(), vec!["a"]);

    session
        .apply(&Intent::set(FieldPath::root("a"), json!("X")))
        .unwrap();
    assert_eq!(session.render_edit().visible_paths(), vec!["a", "b"]);

    session
        .apply(&Intent::set(FieldPath::root("b"), json!("hello")))
        .unwrap();
    assert_eq!(
        session.answers().to_value(),
        json!({ "a": "X", "b": "hello" })
    );
}

#[test]
fn adding_two_entries_and_naming_the_first() {
    let spec = FormSpec::from_value(json!([
        { "id": "items", "type": "repeater", "schema": [{ "id": "name", "type": "text" }] }
    ]))
    .unwrap();
    let mut session = FormSession::new(spec);
    let items = FieldPath::root("items");

    session.apply(&Intent::add_entry(items.clone())).unwrap();
    session.apply(&Intent::add_entry(items.clone())).unwrap();
    session
        .apply(&Intent::set(items.entry(0).field("name"), json!("Jane")))
        .unwrap();

    assert_eq!(
        session.answers().get("items"),
        Some(&json!([{ "name": "Jane" }, {}]))
    );
}

#[test]
fn add_set_remove_leaves_the_remaining_entries_in_order() {
    let spec = FormSpec::from_value(json!([
        { "id": "items", "type": "repeater", "schema": [{ "id": "name", "type": "text" }] }
    ]))
    .unwrap();
    let mut session = FormSession::new(spec).with_answers(AnswerSet::from_value(json!({
        "items": [{ "name": "A" }, { "name": "B" }]
    })));
    let items = FieldPath::root("items");

    session.apply(&Intent::add_entry(items.clone())).unwrap();
    session
        .apply(&Intent::set(items.entry(2).field("name"), json!("C")))
        .unwrap();
    session.apply(&Intent::remove_entry(items, 0)).unwrap();

    assert_eq!(
        session.answers().get("items"),
        Some(&json!([{ "name": "B" }, { "name": "C" }]))
    );
}

#[test]
fn nested_repeater_edits_round_trip_through_the_top_level() {
    let spec = intake();
    let mut host_calls: Vec<(String, Value)> = Vec::new();
    let mut session = FormSession::new(spec.clone()).with_answers(AnswerSet::from_value(json!({
        "dependents": [{ "name": "Byron", "relation": "Child" }, { "name": "Ann" }]
    })));

    let dependents = FieldPath::root("dependents");
    let intents = [
        Intent::add_entry(dependents.entry(0).field("allergies")),
        Intent::set(
            dependents.entry(0).field("allergies").entry(0).field("allergen"),
            json!("Pollen"),
        ),
        Intent::set(dependents.entry(1).field("name"), json!("Anne")),
        Intent::remove_entry(dependents.clone(), 1),
    ];
    for intent in &intents {
        let mut sink = |id: &str, value: Value| host_calls.push((id.to_string(), value));
        formcraft_spec::dispatch_intent(&spec.fields, session.answers(), intent, &mut sink)
            .unwrap();
        session.apply(intent).unwrap();
    }

    assert!(host_calls.iter().all(|(id, _)| id == "dependents"));
    assert_eq!(
        session.answers().to_value(),
        json!({
            "dependents": [
                { "name": "Byron", "relation": "Child", "allergies": [{ "allergen": "Pollen" }] }
            ]
        })
    );
}

#[test]
fn empty_repeater_prints_example_rows_and_table_blank_rows() {
    let spec = intake();
    let options = RenderOptions {
        placeholder_rows: 2,
        table_rows: 4,
        ..RenderOptions::default()
    };
    let doc = render_static(&spec.fields, &AnswerSet::new(), &options);
    let dependents = doc
        .cells()
        .find(|cell| cell.id == "dependents")
        .expect("dependents cell");
    let Content::Repeater { entries } = &dependents.content else {
        panic!("expected repeater content");
    };
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.placeholder));

    let text = render_document_text(&spec.title, spec.description.as_deref(), &doc);
    assert!(text.starts_with("Clinic Intake\n============="));
    assert!(text.contains("1. (example)"));
    assert!(text.contains("| Drug       | Dose       | Since      |"));
}

#[test]
fn every_adapter_accepts_the_fixture() {
    let spec = intake();
    let answers = filled();
    let options = RenderOptions::default();
    let form = render_edit(&spec.fields, &answers);
    let doc = render_static(&spec.fields, &answers, &options);

    let outline = render_edit_text(&spec.title, &form);
    assert!(outline.contains(" - Age (age) <number> = 36"));

    let card = render_card(&spec.title, &form);
    assert_eq!(card["type"], "AdaptiveCard");

    let html = render_print_html(&spec.title, spec.description.as_deref(), &doc, &options)
        .expect("print html");
    assert!(html.contains("@page { size: A4;"));
    assert!(html.contains("Newsletter"));

    let json_ui = serde_json::to_value(&form).expect("serialize form");
    let first_cell = &json_ui["rows"][1]["cells"][0];
    assert_eq!(first_cell["control"], "input");
    assert_eq!(first_cell["path"], json!(["first_name"]));
    assert_eq!(first_cell["width_class"], "1-2");

    let repeater = form
        .cells()
        .find(|cell| cell.id == "dependents")
        .expect("dependents cell");
    let Control::Repeater { entries, add } = &repeater.control else {
        panic!("expected repeater control");
    };
    assert_eq!(entries.len(), 2);
    assert_eq!(add, &Intent::add_entry(FieldPath::root("dependents")));
}

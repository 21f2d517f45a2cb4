use jobarch_core::db::open_db_in_memory;
use jobarch_core::{
    JobArchitectureItemCreate, JobArchitectureRepository, Layer, SqliteJobArchitectureRepository,
    UserId,
};
use serde_json::{json, Value};

#[test]
fn stored_item_serializes_with_lowercase_layers_and_camel_case_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJobArchitectureRepository::try_new(&conn).unwrap();
    let creator = UserId::new_v4();

    let root_id = repo
        .create(None, &JobArchitectureItemCreate::new(Layer::Root, "Company"))
        .unwrap();
    let family_id = repo
        .create(
            Some(root_id),
            &JobArchitectureItemCreate::new(Layer::Family, "Engineering")
                .with_description("Builds things")
                .with_creator(creator),
        )
        .unwrap();

    let family = repo.get_one(family_id).unwrap().unwrap();
    let value = serde_json::to_value(&family).unwrap();

    assert_eq!(value["id"], json!(family_id.to_string()));
    assert_eq!(value["id"].as_str().unwrap().len(), 36);
    assert_eq!(value["level"], "family");
    assert_eq!(value["parentId"], json!(root_id.to_string()));
    assert_eq!(value["parentLevel"], "root");
    assert_eq!(value["title"], "Engineering");
    assert_eq!(value["description"], "Builds things");
    assert_eq!(value["childCount"], 0);
    assert_eq!(value["creator"], json!(creator.to_string()));
    assert_eq!(value["createdAt"], json!(family.created_at));
    assert_eq!(value["updatedAt"], json!(family.updated_at));
    assert!(value["createdAt"].as_i64().unwrap() > 1_600_000_000_000);
}

#[test]
fn absent_optional_fields_are_omitted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJobArchitectureRepository::try_new(&conn).unwrap();
    let root_id = repo
        .create(None, &JobArchitectureItemCreate::new(Layer::Root, "Company"))
        .unwrap();

    let root = repo.get_one(root_id).unwrap().unwrap();
    let value = serde_json::to_value(&root).unwrap();
    let object = value.as_object().unwrap();

    for key in ["parentId", "parentLevel", "description", "creator"] {
        assert!(!object.contains_key(key), "{key} should be omitted");
    }
    assert_eq!(object["level"], "root");
}

#[test]
fn create_request_deserializes_from_client_payload() {
    let payload = json!({
        "level": "role",
        "title": "Backend engineer",
        "description": "Owns services",
    });

    let request: JobArchitectureItemCreate = serde_json::from_value(payload).unwrap();

    assert_eq!(request.layer, Layer::Role);
    assert_eq!(request.title, "Backend engineer");
    assert_eq!(request.description.as_deref(), Some("Owns services"));
    assert!(request.creator.is_none());
}

#[test]
fn create_request_rejects_unknown_layer() {
    let payload = json!({ "level": "team", "title": "Platform" });
    let result: Result<JobArchitectureItemCreate, _> = serde_json::from_value(payload);
    assert!(result.is_err());
}

#[test]
fn item_round_trips_through_json() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJobArchitectureRepository::try_new(&conn).unwrap();
    let root_id = repo
        .create(None, &JobArchitectureItemCreate::new(Layer::Root, "Company"))
        .unwrap();
    let root = repo.get_one(root_id).unwrap().unwrap();

    let text = serde_json::to_string(&root).unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    let decoded: jobarch_core::JobArchitectureItem = serde_json::from_value(parsed).unwrap();

    assert_eq!(root, decoded);
}

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use testthings::TestScope;
use testthings_must::from_json;
use testthings_must::from_json_file;
use testthings_must::from_json_or_panic;

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TypeOne {
    one: String,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TypeTwo {
    two: [String; 2],
}

#[test]
fn decodes_typed_fixtures() {
    let t = TestScope::new("from_json");

    t.run("type one", |t| {
        let actual: TypeOne = from_json(t, r#"{"One": "1"}"#);
        assert_eq!(
            actual,
            TypeOne {
                one: "1".to_string()
            }
        );
    });

    t.run("type two", |t| {
        let actual: TypeTwo = from_json(t, r#"{"Two": ["2", "3"]}"#);
        assert_eq!(
            actual,
            TypeTwo {
                two: ["2".to_string(), "3".to_string()]
            }
        );
    });

    t.run("untyped", |t| {
        let actual: serde_json::Value = from_json(t, br#"{"Three": ["4"]}"#);
        assert_eq!(actual, json!({"Three": ["4"]}));
    });

    assert!(!t.failed());
}

#[test]
#[should_panic(expected = "cannot unmarshal json into")]
fn malformed_fixture_fails_the_test() {
    let t = TestScope::new("malformed");
    let _: TypeOne = from_json(&t, r#"{"One": 1}"#);
}

#[test]
#[should_panic(expected = "cannot unmarshal json into")]
fn malformed_fixture_panics_without_scope() {
    let _: TypeTwo = from_json_or_panic(r#"{"Two": ["only one"]}"#);
}

#[test]
fn loads_fixture_files() {
    let t = TestScope::new("fixture_file");
    let dir = t.temp_dir();
    let path = dir.join("fixture.json");
    std::fs::write(&path, r#"{"One": "from disk"}"#).unwrap();

    let actual: TypeOne = from_json_file(&t, &path);

    assert_eq!(actual.one, "from disk");
}

#[test]
#[should_panic(expected = "cannot read json fixture")]
fn missing_fixture_file_fails_the_test() {
    let t = TestScope::new("missing_fixture");
    let dir = t.temp_dir();
    let _: TypeOne = from_json_file(&t, dir.join("nope.json"));
}

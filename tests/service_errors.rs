//! Integration tests for the service error taxonomy and request isolation

mod common;

use common::{places_config, service};
use serde_json::json;
use tilestats::{
    ComputeError, EngineError, FilterError, FilterSet, ServiceError, WidgetResult,
};

#[tokio::test]
async fn test_unknown_token_is_not_found() {
    let (service, _engine) = service();
    let err = service
        .widget_result("deadbeef", "country_places_count", &FilterSet::empty(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::TokenNotFound(_)));
}

#[tokio::test]
async fn test_unknown_widget_is_not_found() {
    let (service, _engine) = service();
    let token = service
        .register_configuration("localhost", &places_config())
        .await
        .unwrap();

    let err = service
        .widget_result(token.as_str(), "no_such_widget", &FilterSet::empty(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::WidgetNotFound(w) if w == "no_such_widget"));
}

#[tokio::test]
async fn test_engine_failure_surfaces_as_computation() {
    let (service, engine) = service();
    let token = service
        .register_configuration("localhost", &places_config())
        .await
        .unwrap();

    engine.push_error(EngineError::Connection("connection reset".to_string()));

    let err = service
        .widget_result(token.as_str(), "country_places_count", &FilterSet::empty(), true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Computation(ComputeError::Engine(EngineError::Connection(_)))
    ));
    // Exactly one dispatch: the engine call is not retried.
    assert_eq!(engine.query_count(), 1);
}

#[tokio::test]
async fn test_pool_busy_surfaces_as_computation() {
    let (service, engine) = service();
    let token = service
        .register_configuration("localhost", &places_config())
        .await
        .unwrap();

    engine.push_error(EngineError::Busy("no idle connection".to_string()));

    let err = service
        .widget_result(token.as_str(), "country_places_count", &FilterSet::empty(), true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Computation(ComputeError::Engine(EngineError::Busy(_)))
    ));
}

#[tokio::test]
async fn test_failure_is_per_request() {
    let (service, engine) = service();
    let token = service
        .register_configuration("localhost", &places_config())
        .await
        .unwrap();

    engine.push_error(EngineError::Query("syntax error".to_string()));
    engine.push_rows(vec![json!({ "category": "USA", "value": 769 })]);

    let err = service
        .widget_result(token.as_str(), "country_places_count", &FilterSet::empty(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Computation(_)));

    // A sibling request against the same configuration is unaffected.
    let result = service
        .widget_result(token.as_str(), "country_places_count", &FilterSet::empty(), true)
        .await
        .unwrap();
    let WidgetResult::Categories(aggregation) = result else {
        panic!("expected categories result");
    };
    assert_eq!(aggregation.categories[0].category, "USA");
}

#[tokio::test]
async fn test_invalid_filters_are_validation_errors() {
    let (service, _engine) = service();
    let token = service
        .register_configuration("localhost", &places_config())
        .await
        .unwrap();

    let raw = json!({ "layers": [{ "country_places_histogram": { "min": 10, "max": 5 } }] });
    let err = service
        .widget_result_raw(token.as_str(), "country_places_count", Some(&raw), None, true)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(FilterError::InvertedRange { .. })
    ));
}

#[tokio::test]
async fn test_invalid_bbox_is_a_validation_error() {
    let (service, _engine) = service();
    let token = service
        .register_configuration("localhost", &places_config())
        .await
        .unwrap();

    let err = service
        .widget_result_raw(
            token.as_str(),
            "country_places_count",
            None,
            Some("-20,0,45"),
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(FilterError::InvalidBoundingBox(_))
    ));
}

#[tokio::test]
async fn test_invalid_configuration_is_rejected_at_registration() {
    let (service, _engine) = service();
    let raw = json!({
        "analyses": [{ "id": "a0", "sql": "select 1" }],
        "dataviews": {
            "bad": { "type": "heatmap", "source": { "id": "a0" }, "options": {} }
        }
    });
    let err = service
        .register_configuration("localhost", &raw)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Configuration(_)));
}

#[tokio::test]
async fn test_raw_request_with_bbox_and_filters() {
    let (service, engine) = service();
    let token = service
        .register_configuration("localhost", &places_config())
        .await
        .unwrap();

    engine.push_rows(vec![json!({ "category": "TUR", "value": 77 })]);

    let raw = json!({
        "layers": [{
            "country_places_count": { "reject": ["RUS"] },
            "country_places_histogram": { "min": 50000 }
        }]
    });
    let result = service
        .widget_result_raw(
            token.as_str(),
            "country_places_count",
            Some(&raw),
            Some("-20,0,45,60"),
            true,
        )
        .await
        .unwrap();

    let WidgetResult::Categories(aggregation) = result else {
        panic!("expected categories result");
    };
    assert_eq!(aggregation.categories[0].category, "TUR");
    assert!(aggregation.categories.iter().all(|c| c.category != "RUS"));

    let sql = engine.last_query();
    assert!(sql.contains("ST_MakeEnvelope(-20, 0, 45, 60, 4326)"));
    assert!(sql.contains("adm0_a3 NOT IN ('RUS')"));
    assert!(sql.contains("pop_max >= 50000"));
}

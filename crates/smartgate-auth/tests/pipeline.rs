//! End-to-end pipeline scenarios: headers in, ordered rule list out.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use http::HeaderMap;
use http::header::HeaderValue;
use serde_json::json;
use time::OffsetDateTime;
use url::Url;

use smartgate_auth::{
    Action, Compartment, Effect, GateConfig, HeaderCandidate, IssuerConfig, IssuerConfigService,
    ResourceTarget, Rule, SignatureValidator, SignatureValidatorFactory, SmartGate,
    UnverifiedToken,
};

const NOW: i64 = 1_700_000_000;
const ISSUER: &str = "https://idp.example.com";

fn now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(NOW).unwrap()
}

/// Mints an unsigned compact JWS; the signature validator below is a mock,
/// so the placeholder signature part is never inspected.
fn mint(alg: &str, claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&json!({"alg": alg, "typ": "JWT"})).unwrap());
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
    format!("{header}.{claims}.c2ln")
}

fn token_claims(scope: &str, patient: Option<&str>) -> serde_json::Value {
    let mut claims = json!({
        "iss": ISSUER,
        "exp": NOW + 3600,
        "iat": NOW - 60,
        "scope": scope,
    });
    if let Some(patient) = patient {
        claims["patient"] = json!(patient);
    }
    claims
}

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

struct KnownIssuer;

#[async_trait]
impl IssuerConfigService for KnownIssuer {
    async fn lookup(&self, issuer: &str) -> Option<IssuerConfig> {
        (issuer == ISSUER)
            .then(|| IssuerConfig::new(Url::parse("https://idp.example.com/jwks.json").unwrap()))
    }
}

struct AcceptAll;

impl SignatureValidator for AcceptAll {
    fn verify(&self, _token: &UnverifiedToken) -> bool {
        true
    }
}

struct AcceptAllFactory;

#[async_trait]
impl SignatureValidatorFactory for AcceptAllFactory {
    async fn for_key_set(&self, _jwks_uri: &Url) -> Option<Arc<dyn SignatureValidator>> {
        Some(Arc::new(AcceptAll))
    }
}

fn gate(config: GateConfig) -> SmartGate {
    SmartGate::new(config, Arc::new(KnownIssuer), Arc::new(AcceptAllFactory))
}

#[tokio::test]
async fn no_auth_header_yields_metadata_plus_deny() {
    // Scenario A: no auth header present, checking enabled.
    let rules = gate(GateConfig::default())
        .rule_list_at(&HeaderMap::new(), now())
        .await;

    assert_eq!(
        rules,
        vec![
            Rule::allow_metadata(),
            Rule::deny_all("Not authorized (no authorization header found in request)"),
        ]
    );
}

#[tokio::test]
async fn patient_read_scope_yields_compartment_rule() {
    // Scenario B: valid token, patient/Observation.read, patient claim 123.
    let token = mint("RS256", &token_claims("patient/Observation.read", Some("123")));
    let rules = gate(GateConfig::default())
        .rule_list_at(&bearer_headers(&token), now())
        .await;

    assert_eq!(rules.len(), 3);
    assert_eq!(
        rules[0],
        Rule::allow_read(ResourceTarget::Type("Observation".to_string()))
            .in_compartment(Compartment::patient("123"))
    );
    assert_eq!(rules[1], Rule::allow_metadata());
    assert_eq!(rules[2].effect, Effect::Deny);
    assert_eq!(rules[2].action, Action::All);
}

#[tokio::test]
async fn user_wildcard_scope_yields_uncompartmented_rules() {
    // Scenario C: valid token, user/*.*.
    let token = mint("RS256", &token_claims("user/*.*", None));
    let rules = gate(GateConfig::default())
        .rule_list_at(&bearer_headers(&token), now())
        .await;

    assert_eq!(rules.len(), 4);
    assert_eq!(rules[0], Rule::allow_read(ResourceTarget::All));
    assert_eq!(rules[1], Rule::allow_write(ResourceTarget::All));
    assert_eq!(rules[2], Rule::allow_metadata());
    assert_eq!(rules[3].effect, Effect::Deny);
}

#[tokio::test]
async fn patient_scope_without_patient_claim_denies() {
    // Scenario D: patient-level scope but no patient claim on the token.
    let token = mint("RS256", &token_claims("patient/Patient.write", None));
    let rules = gate(GateConfig::default())
        .rule_list_at(&bearer_headers(&token), now())
        .await;

    assert_eq!(
        rules,
        vec![Rule::allow_metadata(), Rule::deny_all("No patient claim found")]
    );
}

#[tokio::test]
async fn disabled_checking_allows_everything() {
    // Scenario E: checking disabled; headers and token content irrelevant.
    let gate = gate(GateConfig::default().disabled());

    let rules = gate.rule_list_at(&HeaderMap::new(), now()).await;
    assert_eq!(rules, vec![Rule::allow_all()]);

    let mut headers = HeaderMap::new();
    headers.insert("authorization", HeaderValue::from_static("Basic garbage"));
    let rules = gate.rule_list_at(&headers, now()).await;
    assert_eq!(rules, vec![Rule::allow_all()]);
}

#[tokio::test]
async fn no_smart_scopes_denies_with_reason() {
    let token = mint("RS256", &token_claims("openid profile", None));
    let rules = gate(GateConfig::default())
        .rule_list_at(&bearer_headers(&token), now())
        .await;

    assert_eq!(
        rules,
        vec![Rule::allow_metadata(), Rule::deny_all("No scope found")]
    );
}

#[tokio::test]
async fn expired_token_denies_with_reason() {
    let mut claims = token_claims("user/*.*", None);
    claims["exp"] = json!(NOW - 3600);

    let token = mint("RS256", &claims);
    let rules = gate(GateConfig::default())
        .rule_list_at(&bearer_headers(&token), now())
        .await;

    assert_eq!(
        rules,
        vec![
            Rule::allow_metadata(),
            Rule::deny_all("Not authorized (token is expired)"),
        ]
    );
}

#[tokio::test]
async fn symmetric_token_denies_with_reason() {
    let token = mint("HS256", &token_claims("user/*.*", None));
    let rules = gate(GateConfig::default())
        .rule_list_at(&bearer_headers(&token), now())
        .await;

    assert_eq!(
        rules,
        vec![
            Rule::allow_metadata(),
            Rule::deny_all("Not authorized (signature algorithm not supported)"),
        ]
    );
}

#[tokio::test]
async fn admin_mode_treats_valid_token_as_admin() {
    let gate = gate(GateConfig::default().with_admin_mode(true));

    // Valid token: full access regardless of scopes.
    let token = mint("RS256", &token_claims("openid", None));
    let rules = gate.rule_list_at(&bearer_headers(&token), now()).await;
    assert_eq!(rules, vec![Rule::allow_all()]);

    // Invalid token still fails authentication in admin mode.
    let rules = gate.rule_list_at(&HeaderMap::new(), now()).await;
    assert_eq!(rules[1].effect, Effect::Deny);
}

#[tokio::test]
async fn fallback_header_convention() {
    let config = GateConfig::default()
        .with_fallback_header(HeaderCandidate::new("x-access-token", "Bearer "));
    let gate = gate(config);

    let token = mint("RS256", &token_claims("user/Patient.read", None));
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-access-token",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );

    let rules = gate.rule_list_at(&headers, now()).await;
    assert_eq!(
        rules[0],
        Rule::allow_read(ResourceTarget::Type("Patient".to_string()))
    );
}

#[tokio::test]
async fn pipeline_is_idempotent() {
    let token = mint(
        "RS256",
        &token_claims("patient/Observation.read user/Encounter.write", Some("123")),
    );
    let headers = bearer_headers(&token);
    let gate = gate(GateConfig::default());

    let first = gate.rule_list_at(&headers, now()).await;
    let second = gate.rule_list_at(&headers, now()).await;
    assert_eq!(first, second);

    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(first_json, second_json);
}

#[tokio::test]
async fn authenticate_exposes_validated_claims() {
    // Uses the wall-clock entry point, so the claims are minted relative
    // to the real current time.
    let wall_now = OffsetDateTime::now_utc().unix_timestamp();
    let token = mint(
        "RS256",
        &json!({
            "iss": ISSUER,
            "exp": wall_now + 3600,
            "iat": wall_now - 60,
            "scope": "user/*.read",
            "patient": "Patient/42",
        }),
    );
    let gate = gate(GateConfig::default());

    let bearer = gate.authenticate(&bearer_headers(&token)).await.unwrap();
    assert_eq!(bearer.issuer(), ISSUER);
    assert_eq!(bearer.scope(), "user/*.read");
    assert_eq!(bearer.patient(), Some("Patient/42"));
}

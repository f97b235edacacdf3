/// Integration tests with a mocked hosted backend
/// Exercises the REST client without hitting the real service
use rust_simulador_api::backend::SimulationBackend;
use rust_simulador_api::errors::AppError;
use rust_simulador_api::models::NewSimulation;
use rust_simulador_api::supabase_client::SupabaseClient;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(server.uri(), "anon-key".to_string()).unwrap()
}

fn new_simulation() -> NewSimulation {
    NewSimulation {
        nome: "João da Silva".to_string(),
        contato: "11987654321".to_string(),
        ano: "2021".to_string(),
        marca: "Toyota".to_string(),
        modelo: "Corolla".to_string(),
        placa: "ABC-1234".to_string(),
        plano_selecionado: "hbs_select".to_string(),
        parceiras_selecionadas: vec!["Baypro".to_string()],
    }
}

#[tokio::test]
async fn test_insert_simulation_success() {
    let mock_server = MockServer::start().await;
    let record = new_simulation();

    Mock::given(method("POST"))
        .and(path("/rest/v1/insurance_simulations"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .and(header("Prefer", "return=minimal"))
        .and(body_json(&record))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).insert_simulation(&record).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_insert_simulation_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/insurance_simulations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .insert_simulation(&new_simulation())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RemoteWrite(ref m) if m.contains("boom")));
}

#[tokio::test]
async fn test_custom_table_names() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/simulacoes"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server).with_tables("simulacoes", "papeis");
    assert!(client.insert_simulation(&new_simulation()).await.is_ok());
}

#[tokio::test]
async fn test_list_simulations_ordered_request() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!([
        {
            "id": "0b6c2c5e-54b3-4a70-a4a7-3a4d7e0f2d11",
            "created_at": "2025-04-02T18:30:00.123456+00:00",
            "nome": "Maria Santos",
            "contato": "21999998888",
            "ano": "2017",
            "marca": "Honda",
            "modelo": "Civic",
            "placa": "XYZ9A87",
            "plano_selecionado": "hbs_economic",
            "parceiras_selecionadas": ["Moove"]
        },
        {
            "id": "9a0e1c77-3b45-4f0a-8b0b-1f2c3d4e5f60",
            "created_at": "2025-04-01T10:00:00+00:00",
            "nome": "Pedro Alves",
            "contato": "31988887777",
            "ano": "2015",
            "marca": "Fiat",
            "modelo": "Uno",
            "placa": "KLM1234",
            "plano_selecionado": "hbs_majorado",
            "parceiras_selecionadas": null
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/insurance_simulations"))
        .and(query_param("select", "*"))
        .and(query_param("order", "created_at.desc"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let records = client(&mock_server)
        .list_simulations("user-token")
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].nome, "Maria Santos");
    assert_eq!(records[0].partners(), ["Moove".to_string()]);
    assert!(records[1].partners().is_empty());
}

#[tokio::test]
async fn test_list_simulations_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/insurance_simulations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).list_simulations("old").await.unwrap_err();
    assert!(matches!(err, AppError::RemoteRead(_)));
}

#[tokio::test]
async fn test_fetch_roles() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/user_roles"))
        .and(query_param("select", "role"))
        .and(query_param("user_id", "eq.user-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "role": "admin" }, { "role": "user" }])),
        )
        .mount(&mock_server)
        .await;

    let roles = client(&mock_server)
        .fetch_roles("user-1", "user-token")
        .await
        .unwrap();
    assert_eq!(roles, vec!["admin".to_string(), "user".to_string()]);
}

#[tokio::test]
async fn test_sign_in_with_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(serde_json::json!({
            "email": "admin@safeclub.com",
            "password": "secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": "user-1", "email": "admin@safeclub.com", "aud": "authenticated" }
        })))
        .mount(&mock_server)
        .await;

    let session = client(&mock_server)
        .sign_in_with_password("admin@safeclub.com", "secret")
        .await
        .unwrap();

    assert_eq!(session.access_token, "jwt-token");
    assert_eq!(session.user.id, "user-1");
}

#[tokio::test]
async fn test_sign_in_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .sign_in_with_password("admin@safeclub.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
}

#[tokio::test]
async fn test_get_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer good"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": "user-1", "email": "a@b.com" })),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let user = client.get_session("good").await.unwrap().unwrap();
    assert_eq!(user.id, "user-1");
    assert!(client.get_session("expired").await.unwrap().is_none());
}

#[tokio::test]
async fn test_sign_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("Authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert!(client(&mock_server).sign_out("user-token").await.is_ok());
}

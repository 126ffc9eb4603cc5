#[macro_use]
extern crate rocket;

use rocket::response::content;
use rocket::serde::json::Json;
use rocket::State;
use rocket_cors::{AllowedOrigins, CorsOptions};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use risk_warpath::session::{
    DefendData, DistributeData, NewMatchData, Request, Response, Session, SnapshotData,
    TroopsAfterAttackData,
};

struct RequestWithResponse {
    request: Request,
    response_sender: oneshot::Sender<Response>,
}

struct SharedState {
    sender: mpsc::Sender<RequestWithResponse>,
}

#[derive(Serialize)]
struct ApiEndpoint {
    path: String,
    method: String,
    description: String,
}

fn endpoint(path: &str, method: &str, description: &str) -> ApiEndpoint {
    ApiEndpoint {
        path: path.to_string(),
        method: method.to_string(),
        description: description.to_string(),
    }
}

#[get("/")]
fn api_documentation() -> content::RawJson<String> {
    let endpoints = vec![
        endpoint("/", "GET", "Shows this API documentation"),
        endpoint(
            "/new-match",
            "POST",
            "Start a match as the given player, optionally with a map and bot config file",
        ),
        endpoint("/distribute", "POST", "Distribute reinforcement troops"),
        endpoint("/attack", "POST", "Next attack along the current plan, or pass"),
        endpoint(
            "/troops-after-attack",
            "POST",
            "Troops to move into a conquered territory",
        ),
        endpoint("/defend", "POST", "Number of troops to defend with"),
        endpoint("/fortify", "POST", "End-of-turn troop movement"),
        endpoint("/state", "GET", "Focus, region states and the current attack plan"),
    ];

    content::RawJson(serde_json::to_string_pretty(&endpoints).unwrap_or_default())
}

#[post("/new-match", data = "<data>")]
async fn new_match(data: Json<NewMatchData>, state: &State<SharedState>) -> Json<Response> {
    send_request_and_wait(state, Request::NewMatch(data.into_inner())).await
}

#[post("/distribute", data = "<data>")]
async fn distribute(data: Json<DistributeData>, state: &State<SharedState>) -> Json<Response> {
    send_request_and_wait(state, Request::Distribute(data.into_inner())).await
}

#[post("/attack", data = "<data>")]
async fn attack(data: Json<SnapshotData>, state: &State<SharedState>) -> Json<Response> {
    send_request_and_wait(state, Request::Attack(data.into_inner())).await
}

#[post("/troops-after-attack", data = "<data>")]
async fn troops_after_attack(
    data: Json<TroopsAfterAttackData>,
    state: &State<SharedState>,
) -> Json<Response> {
    send_request_and_wait(state, Request::TroopsAfterAttack(data.into_inner())).await
}

#[post("/defend", data = "<data>")]
async fn defend(data: Json<DefendData>, state: &State<SharedState>) -> Json<Response> {
    send_request_and_wait(state, Request::Defend(data.into_inner())).await
}

#[post("/fortify", data = "<data>")]
async fn fortify(data: Json<SnapshotData>, state: &State<SharedState>) -> Json<Response> {
    send_request_and_wait(state, Request::Fortify(data.into_inner())).await
}

#[get("/state")]
async fn planner_state(state: &State<SharedState>) -> Json<Response> {
    send_request_and_wait(state, Request::GetState).await
}

async fn send_request_and_wait(state: &State<SharedState>, request: Request) -> Json<Response> {
    let (response_sender, response_receiver) = oneshot::channel();
    state
        .sender
        .send(RequestWithResponse {
            request,
            response_sender,
        })
        .await
        .expect("Failed to send request");

    let response = response_receiver.await.expect("Failed to receive response");
    Json(response)
}

async fn worker_task(
    mut receiver: mpsc::Receiver<RequestWithResponse>,
    session: Arc<Mutex<Session>>,
) {
    while let Some(RequestWithResponse {
        request,
        response_sender,
    }) = receiver.recv().await
    {
        let mut session = session.lock().await;
        // Planning is CPU bound; keep it off the async executor threads.
        let response = tokio::task::block_in_place(|| session.handle(request));
        if response_sender.send(response).is_err() {
            warn!("client went away before the response was ready");
        }
    }
}

#[launch]
async fn rocket() -> _ {
    let env_filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let (sender, receiver) = mpsc::channel::<RequestWithResponse>(100);
    let session = Arc::new(Mutex::new(Session::new()));

    tokio::spawn(worker_task(receiver, session.clone()));

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .to_cors()
        .expect("Error creating CORS middleware");

    rocket::build()
        .manage(SharedState { sender })
        .mount(
            "/",
            routes![
                api_documentation,
                new_match,
                distribute,
                attack,
                troops_after_attack,
                defend,
                fortify,
                planner_state
            ],
        )
        .attach(cors)
}

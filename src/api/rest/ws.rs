use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::rest::map::{mount_session, render_scene, SceneFrame};
use crate::map::session::MapSession;
use crate::map::surface::{OverlayId, SceneSurface};
use crate::models::collector::RosterFilter;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Select {
        collector_id: Option<Uuid>,
    },
    MarkerClick {
        overlay_id: u64,
    },
    ToggleRouteHistory,
    SetShowClients {
        visible: bool,
    },
    Filter {
        #[serde(default)]
        query: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Scene(SceneFrame),
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, receiver) = socket.split();
    run_session(state, sender, receiver).await;
}

/// One live map per connection. Roster events and client messages are
/// handled on this task only, so reconciles never overlap.
pub async fn run_session<S, R, E>(state: Arc<AppState>, mut sender: S, mut receiver: R)
where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let mut roster_events = BroadcastStream::new(state.roster_events_tx.subscribe());

    let mut session = mount_session(&state);
    state.metrics.map_sessions.inc();
    info!("map session connected");

    let initial = render_scene(&state, &mut session, "mount");
    if send_frame(&mut sender, initial).await {
        loop {
            let trigger = tokio::select! {
                event = roster_events.next() => match event {
                    Some(Ok(event)) => {
                        debug!(collector_id = %event.collector_id, kind = ?event.kind, "roster changed");
                        "roster"
                    }
                    Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                        warn!(skipped, "map session lagged behind roster events");
                        "roster"
                    }
                    None => break,
                },
                message = receiver.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(message) => {
                                if !apply_client_message(&mut session, message) {
                                    continue;
                                }
                                "interaction"
                            }
                            Err(err) => {
                                warn!(error = %err, "ignoring malformed map session message");
                                continue;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        warn!(error = %err, "map session socket error");
                        break;
                    }
                },
            };

            let frame = render_scene(&state, &mut session, trigger);
            if !send_frame(&mut sender, frame).await {
                break;
            }
        }
    }

    session.dispose();
    state.metrics.map_sessions.dec();
    info!("map session disconnected");
}

/// Returns false when the message changed nothing worth re-rendering.
pub fn apply_client_message(session: &mut MapSession<SceneSurface>, message: ClientMessage) -> bool {
    match message {
        ClientMessage::Select { collector_id } => session.select(collector_id),
        ClientMessage::MarkerClick { overlay_id } => {
            if !session.click(OverlayId(overlay_id)) {
                debug!(overlay_id, "click on non-collector overlay");
                return false;
            }
        }
        ClientMessage::ToggleRouteHistory => {
            session.toggle_route_history();
        }
        ClientMessage::SetShowClients { visible } => session.set_show_clients(visible),
        ClientMessage::Filter { query, status } => {
            session.set_filter(RosterFilter::new(query.as_deref(), status.as_deref()));
        }
    }
    true
}

async fn send_frame<S>(sender: &mut S, frame: SceneFrame) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(&ServerMessage::Scene(frame)) {
        Ok(json) => json,
        Err(err) => {
            warn!(error = %err, "failed to serialize scene for ws");
            return true;
        }
    };

    sender.send(Message::Text(json.into())).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::ws::Message;
    use chrono::{TimeZone, Utc};
    use futures::channel::mpsc;
    use futures::StreamExt;
    use serde_json::Value;
    use uuid::Uuid;

    use super::{apply_client_message, run_session, ClientMessage};
    use crate::api::rest::map::{mount_session, render_scene};
    use crate::config::Config;
    use crate::map::surface::Layer;
    use crate::models::collector::{
        Collector, CollectorStatus, Location, LocationHistoryEntry,
    };
    use crate::models::event::{RosterEvent, RosterEventKind};
    use crate::state::AppState;

    fn collector(id: u128, name: &str, status: CollectorStatus, lat: f64) -> Collector {
        let at = Utc.with_ymd_and_hms(2025, 1, 27, 11, 0, 0).unwrap();
        Collector {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            phone: String::new(),
            email: String::new(),
            status,
            current_location: Location::new(lat, 72.57, at),
            location_history: Vec::new(),
            current_task: None,
            total_collected: 0.0,
            tasks_completed: 0,
            financial_year: "FY2024-25".to_string(),
        }
    }

    fn roster_state() -> Arc<AppState> {
        let (state, _updates) = AppState::new(Config::default());

        let mut arjun = collector(1, "Arjun Sharma", CollectorStatus::Active, 23.035);
        arjun.location_history.push(LocationHistoryEntry {
            location: Location::new(23.0225, 72.5714, Utc.with_ymd_and_hms(2025, 1, 27, 9, 0, 0).unwrap()),
            duration_minutes: 20,
            client_visited: None,
        });
        let rahul = collector(3, "Rahul Kumar", CollectorStatus::Offline, 23.05);

        for collector in [arjun, rahul] {
            state.collectors.insert(collector.id, collector);
        }
        Arc::new(state)
    }

    fn text(raw: &str) -> Message {
        Message::Text(raw.to_string().into())
    }

    async fn next_frame(frames: &mut mpsc::UnboundedReceiver<Message>) -> Value {
        let message = tokio::time::timeout(Duration::from_secs(2), frames.next())
            .await
            .unwrap()
            .unwrap();
        match message {
            Message::Text(body) => serde_json::from_str(&body).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[test]
    fn client_messages_are_tagged_by_type() {
        let select: ClientMessage = serde_json::from_str(&format!(
            r#"{{"type":"select","collector_id":"{}"}}"#,
            Uuid::from_u128(9)
        ))
        .unwrap();
        assert!(matches!(
            select,
            ClientMessage::Select { collector_id: Some(id) } if id == Uuid::from_u128(9)
        ));

        let clear: ClientMessage =
            serde_json::from_str(r#"{"type":"select","collector_id":null}"#).unwrap();
        assert!(matches!(clear, ClientMessage::Select { collector_id: None }));

        let toggle: ClientMessage =
            serde_json::from_str(r#"{"type":"toggle_route_history"}"#).unwrap();
        assert!(matches!(toggle, ClientMessage::ToggleRouteHistory));

        let filter: ClientMessage =
            serde_json::from_str(r#"{"type":"filter","status":"active"}"#).unwrap();
        assert!(matches!(
            filter,
            ClientMessage::Filter { query: None, status: Some(ref status) } if status == "active"
        ));
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"zoom","level":3}"#).is_err());
    }

    #[test]
    fn select_then_toggle_route_history() {
        let state = roster_state();
        let mut session = mount_session(&state);

        assert!(apply_client_message(
            &mut session,
            ClientMessage::Select {
                collector_id: Some(Uuid::from_u128(1))
            }
        ));
        let frame = render_scene(&state, &mut session, "interaction");
        assert_eq!(frame.selected, Some(Uuid::from_u128(1)));
        assert_eq!(frame.report.as_ref().unwrap().route_points, 2);

        assert!(apply_client_message(&mut session, ClientMessage::ToggleRouteHistory));
        let frame = render_scene(&state, &mut session, "interaction");
        assert!(!frame.show_route_history);
        assert!(!frame.legend.show_route_history);
        assert_eq!(frame.report.as_ref().unwrap().route_points, 0);
    }

    #[test]
    fn marker_click_selects_only_collector_markers() {
        let state = roster_state();
        let mut session = mount_session(&state);
        render_scene(&state, &mut session, "mount");

        let scene = session.scene().unwrap();
        let basemap = scene.in_layer(Layer::Basemap).next().unwrap().id;
        assert!(!apply_client_message(
            &mut session,
            ClientMessage::MarkerClick { overlay_id: basemap.0 }
        ));
        assert_eq!(session.selected(), None);

        let marker = scene.in_layer(Layer::CollectorMarkers).next().unwrap().id;
        assert!(apply_client_message(
            &mut session,
            ClientMessage::MarkerClick { overlay_id: marker.0 }
        ));
        assert!(session.selected().is_some());
    }

    #[test]
    fn filter_and_client_toggle_reshape_the_scene() {
        let state = roster_state();
        let mut session = mount_session(&state);

        assert!(apply_client_message(
            &mut session,
            ClientMessage::SetShowClients { visible: false }
        ));
        assert!(apply_client_message(
            &mut session,
            ClientMessage::Filter {
                query: None,
                status: Some("offline".to_string()),
            }
        ));

        let frame = render_scene(&state, &mut session, "interaction");
        assert!(!frame.show_clients);
        let report = frame.report.unwrap();
        assert_eq!(report.collector_markers, 1);
        assert_eq!(report.client_markers, 0);

        assert!(apply_client_message(
            &mut session,
            ClientMessage::Filter {
                query: Some("nobody".to_string()),
                status: None,
            }
        ));
        let report = render_scene(&state, &mut session, "interaction").report.unwrap();
        assert_eq!(report.collector_markers, 0);
        assert!(report.camera.is_none());
    }

    #[tokio::test]
    async fn session_rerenders_on_roster_events_and_messages() {
        let state = roster_state();
        let (frames_tx, mut frames) = mpsc::unbounded::<Message>();
        let (inbound_tx, inbound) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let session = tokio::spawn(run_session(state.clone(), frames_tx, inbound));

        let initial = next_frame(&mut frames).await;
        assert_eq!(initial["type"], "scene");
        assert_eq!(initial["report"]["collector_markers"], 2);
        assert_eq!(state.metrics.map_sessions.get(), 1);

        let sneha = collector(4, "Sneha Desai", CollectorStatus::Idle, 22.99);
        state.collectors.insert(sneha.id, sneha);
        state.publish(RosterEvent::now(Uuid::from_u128(4), RosterEventKind::Registered));

        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["report"]["collector_markers"], 3);

        inbound_tx
            .unbounded_send(Ok(text(r#"{"type":"marker_click","overlay_id":1}"#)))
            .unwrap();
        inbound_tx
            .unbounded_send(Ok(text(r#"{"type":"toggle_route_history"}"#)))
            .unwrap();

        // The tile click produced no frame, so the next one is the toggle.
        let frame = next_frame(&mut frames).await;
        assert_eq!(frame["show_route_history"], false);

        drop(inbound_tx);
        tokio::time::timeout(Duration::from_secs(2), session)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.metrics.map_sessions.get(), 0);
    }
}

//! Popup content attached to map markers.
//!
//! Each popup is plain data with a fixed schema; `render_html` turns it into
//! markup for hosts that display it directly, everyone else can template the
//! serialized form.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use crate::format::{clock_time, format_inr, time_ago};
use crate::map::markers::WaypointRole;
use crate::map::route::Waypoint;
use crate::models::collector::{Collector, CollectorStatus};
use crate::models::task::Task;

#[derive(Debug, Clone, Copy)]
pub struct PopupContext {
    pub now: DateTime<Utc>,
    pub display_offset: FixedOffset,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskLine {
    pub company_name: String,
    pub amount_to_collect: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectorPopup {
    pub name: String,
    pub initial: String,
    pub status: CollectorStatus,
    pub address: Option<String>,
    pub task: Option<TaskLine>,
    pub last_update: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientPopup {
    pub company_name: String,
    pub contact_name: String,
    pub address: String,
    pub task_description: String,
    pub amount_to_collect: String,
    pub amount_collected: String,
    pub assigned_to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartPopup {
    pub address: Option<String>,
    pub time: String,
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopPopup {
    pub number: usize,
    pub address: Option<String>,
    pub time: String,
    pub duration_minutes: Option<u32>,
    pub client_visited: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentPopup {
    pub collector_name: String,
    pub status: CollectorStatus,
    pub address: Option<String>,
    pub last_update: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Popup {
    Collector(CollectorPopup),
    Client(ClientPopup),
    RouteStart(StartPopup),
    RouteStop(StopPopup),
    RouteCurrent(CurrentPopup),
}

impl Popup {
    pub fn for_collector(collector: &Collector, ctx: &PopupContext) -> Self {
        Popup::Collector(CollectorPopup {
            name: collector.name.clone(),
            initial: collector
                .name
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_default(),
            status: collector.status,
            address: collector.current_location.address.clone(),
            task: collector.current_task.as_ref().map(|task| TaskLine {
                company_name: task.client.company_name.clone(),
                amount_to_collect: format_inr(task.amount_to_collect),
            }),
            last_update: time_ago(collector.current_location.timestamp, ctx.now),
        })
    }

    pub fn for_client(collector: &Collector, task: &Task) -> Self {
        Popup::Client(ClientPopup {
            company_name: task.client.company_name.clone(),
            contact_name: task.client.name.clone(),
            address: task.client.address.clone(),
            task_description: task.description.clone(),
            amount_to_collect: format_inr(task.amount_to_collect),
            amount_collected: format_inr(task.amount_collected),
            assigned_to: collector.name.clone(),
        })
    }

    pub fn for_waypoint(waypoint: &Waypoint, collector: &Collector, ctx: &PopupContext) -> Self {
        let address = waypoint.location.address.clone();
        let time = clock_time(waypoint.location.timestamp, ctx.display_offset);

        match waypoint.role {
            WaypointRole::Start => Popup::RouteStart(StartPopup {
                address,
                time,
                duration_minutes: waypoint.duration_minutes.filter(|minutes| *minutes > 0),
            }),
            WaypointRole::Stop | WaypointRole::ClientVisit => Popup::RouteStop(StopPopup {
                number: waypoint.index + 1,
                address,
                time,
                duration_minutes: waypoint.duration_minutes.filter(|minutes| *minutes > 0),
                client_visited: waypoint
                    .client_visited
                    .as_ref()
                    .map(|client| client.company_name.clone()),
            }),
            WaypointRole::Current => Popup::RouteCurrent(CurrentPopup {
                collector_name: collector.name.clone(),
                status: collector.status,
                address,
                last_update: time_ago(waypoint.location.timestamp, ctx.now),
            }),
        }
    }

    pub fn render_html(&self) -> String {
        let mut html = String::new();
        // Writing into a String cannot fail.
        let _ = match self {
            Popup::Collector(popup) => render_collector(&mut html, popup),
            Popup::Client(popup) => render_client(&mut html, popup),
            Popup::RouteStart(popup) => render_start(&mut html, popup),
            Popup::RouteStop(popup) => render_stop(&mut html, popup),
            Popup::RouteCurrent(popup) => render_current(&mut html, popup),
        };
        html
    }
}

fn render_collector(out: &mut String, popup: &CollectorPopup) -> std::fmt::Result {
    write!(
        out,
        "<div class=\"popup popup-collector\"><div class=\"popup-header\">\
         <span class=\"avatar\">{}</span><h3>{}</h3>\
         <span class=\"status-badge status-{}\">{}</span></div>",
        escape(&popup.initial),
        escape(&popup.name),
        popup.status,
        popup.status
    )?;
    if let Some(address) = &popup.address {
        write!(out, "<p class=\"address\">📍 {}</p>", escape(address))?;
    }
    if let Some(task) = &popup.task {
        write!(
            out,
            "<div class=\"task\"><p class=\"label\">Current Task:</p><p>{}</p>\
             <p class=\"amount\">{}</p></div>",
            escape(&task.company_name),
            escape(&task.amount_to_collect)
        )?;
    }
    write!(
        out,
        "<p class=\"updated\">Last update: {}</p></div>",
        escape(&popup.last_update)
    )
}

fn render_client(out: &mut String, popup: &ClientPopup) -> std::fmt::Result {
    write!(
        out,
        "<div class=\"popup popup-client\"><h3>{}</h3><p>{}</p>\
         <p class=\"address\">📍 {}</p>\
         <div class=\"task\"><p class=\"label\">Task:</p><p>{}</p>\
         <p><span>To Collect:</span> <strong>{}</strong></p>\
         <p><span>Collected:</span> <strong>{}</strong></p></div>\
         <p class=\"assignee\">Assigned to: {}</p></div>",
        escape(&popup.company_name),
        escape(&popup.contact_name),
        escape(&popup.address),
        escape(&popup.task_description),
        escape(&popup.amount_to_collect),
        escape(&popup.amount_collected),
        escape(&popup.assigned_to)
    )
}

fn render_start(out: &mut String, popup: &StartPopup) -> std::fmt::Result {
    write!(
        out,
        "<div class=\"popup popup-waypoint waypoint-start\"><h3>Start Point</h3>"
    )?;
    render_place(out, popup.address.as_deref(), &popup.time, popup.duration_minutes)?;
    out.write_str("</div>")
}

fn render_stop(out: &mut String, popup: &StopPopup) -> std::fmt::Result {
    write!(
        out,
        "<div class=\"popup popup-waypoint waypoint-stop\"><h3>Stop #{}</h3>",
        popup.number
    )?;
    render_place(out, popup.address.as_deref(), &popup.time, popup.duration_minutes)?;
    if let Some(client) = &popup.client_visited {
        write!(out, "<p class=\"visit\">Visited: {}</p>", escape(client))?;
    }
    out.write_str("</div>")
}

fn render_current(out: &mut String, popup: &CurrentPopup) -> std::fmt::Result {
    write!(
        out,
        "<div class=\"popup popup-waypoint waypoint-current\"><h3>Current Location</h3>\
         <p>{} <span class=\"status-badge status-{}\">{}</span></p>",
        escape(&popup.collector_name),
        popup.status,
        popup.status
    )?;
    if let Some(address) = &popup.address {
        write!(out, "<p class=\"address\">📍 {}</p>", escape(address))?;
    }
    write!(
        out,
        "<p class=\"updated\">Last update: {}</p></div>",
        escape(&popup.last_update)
    )
}

fn render_place(
    out: &mut String,
    address: Option<&str>,
    time: &str,
    duration_minutes: Option<u32>,
) -> std::fmt::Result {
    if let Some(address) = address {
        write!(out, "<p class=\"address\">📍 {}</p>", escape(address))?;
    }
    write!(out, "<p class=\"time\">{}</p>", escape(time))?;
    if let Some(minutes) = duration_minutes {
        write!(out, "<p class=\"duration\">{minutes} min</p>")?;
    }
    Ok(())
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone, Utc};
    use uuid::Uuid;

    use super::{Popup, PopupContext};
    use crate::map::route::reconstruct;
    use crate::models::collector::{Collector, CollectorStatus, Location, LocationHistoryEntry};
    use crate::models::task::{Client, Task, TaskStatus};

    fn ctx() -> PopupContext {
        PopupContext {
            now: Utc.with_ymd_and_hms(2025, 1, 27, 9, 0, 0).unwrap(),
            display_offset: FixedOffset::east_opt(19_800).unwrap(),
        }
    }

    fn client() -> Client {
        Client {
            id: Uuid::from_u128(7),
            name: "Rajesh Patel".to_string(),
            company_name: "Patel Industries <Pvt> Ltd".to_string(),
            address: "C.G. Road, Navrangpura, Ahmedabad".to_string(),
            location: Location::new(23.034, 72.556, ctx().now),
            phone: "+91 98765 43210".to_string(),
            email: "rajesh@patelindustries.com".to_string(),
            outstanding_amount: 125_000.0,
        }
    }

    fn collector() -> Collector {
        let now = ctx().now;
        let mut visit = LocationHistoryEntry {
            location: Location::new(23.025, 72.58, now - Duration::minutes(40))
                .with_address("Ashram Road"),
            duration_minutes: 45,
            client_visited: None,
        };
        visit.client_visited = Some(client());

        Collector {
            id: Uuid::from_u128(1),
            name: "arjun Sharma".to_string(),
            phone: String::new(),
            email: String::new(),
            status: CollectorStatus::Active,
            current_location: Location::new(23.034, 72.556, now - Duration::minutes(5))
                .with_address("C.G. Road, Navrangpura"),
            location_history: vec![
                LocationHistoryEntry {
                    location: Location::new(23.0225, 72.5714, now - Duration::minutes(60))
                        .with_address("Office HQ"),
                    duration_minutes: 30,
                    client_visited: None,
                },
                visit,
            ],
            current_task: Some(Task {
                id: Uuid::from_u128(100),
                client: client(),
                assigned_to: Uuid::from_u128(1),
                description: "Collect quarterly payment for Q3".to_string(),
                amount_to_collect: 125_000.0,
                amount_collected: 0.0,
                status: TaskStatus::InProgress,
                created_at: now,
                completed_at: None,
                financial_year: "FY2024-25".to_string(),
            }),
            total_collected: 285_000.0,
            tasks_completed: 12,
            financial_year: "FY2024-25".to_string(),
        }
    }

    #[test]
    fn collector_popup_summarises_task_and_recency() {
        let Popup::Collector(popup) = Popup::for_collector(&collector(), &ctx()) else {
            panic!("expected collector popup");
        };

        assert_eq!(popup.initial, "A");
        assert_eq!(popup.address.as_deref(), Some("C.G. Road, Navrangpura"));
        assert_eq!(popup.last_update, "5 minutes ago");
        let task = popup.task.unwrap();
        assert_eq!(task.amount_to_collect, "₹1,25,000");
    }

    #[test]
    fn client_popup_html_is_escaped() {
        let collector = collector();
        let task = collector.current_task.clone().unwrap();
        let html = Popup::for_client(&collector, &task).render_html();

        assert!(html.contains("Patel Industries &lt;Pvt&gt; Ltd"));
        assert!(html.contains("To Collect:</span> <strong>₹1,25,000"));
        assert!(html.contains("Collected:</span> <strong>₹0"));
        assert!(html.contains("Assigned to: arjun Sharma"));
    }

    #[test]
    fn waypoint_popups_follow_role() {
        let collector = collector();
        let route = reconstruct(&collector).unwrap();
        let popups: Vec<Popup> = route
            .waypoints
            .iter()
            .map(|waypoint| Popup::for_waypoint(waypoint, &collector, &ctx()))
            .collect();

        match &popups[0] {
            Popup::RouteStart(start) => {
                assert_eq!(start.address.as_deref(), Some("Office HQ"));
                assert_eq!(start.time, "01:30 PM");
                assert_eq!(start.duration_minutes, Some(30));
            }
            other => panic!("expected start popup, got {other:?}"),
        }

        match &popups[1] {
            Popup::RouteStop(stop) => {
                assert_eq!(stop.number, 2);
                assert_eq!(stop.duration_minutes, Some(45));
                assert!(stop.client_visited.as_deref().unwrap().starts_with("Patel"));
            }
            other => panic!("expected stop popup, got {other:?}"),
        }

        assert!(matches!(popups[2], Popup::RouteCurrent(_)));
        assert!(popups[2].render_html().contains("Current Location"));
    }

    #[test]
    fn popup_serializes_with_kind_tag() {
        let json = serde_json::to_value(Popup::for_collector(&collector(), &ctx())).unwrap();
        assert_eq!(json["kind"], "collector");
        assert_eq!(json["status"], "active");
    }
}

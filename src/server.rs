//! Local page hosting the map widget
//!
//! One worker, one session. `GET /` draws the current view state and
//! `POST /interact` applies the checkbox values (and the last map position,
//! when the map was moved) before drawing again.

use std::sync::{Mutex, PoisonError};

use actix_web::{App, HttpResponse, HttpServer, web};
use serde::Deserialize;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::render::MapDocument;
use crate::session::{FilterFlags, GeoPoint, Interaction, ViewState, Viewport};

/// Shared state backing HTTP handlers.
pub struct ServerState {
    dataset: &'static Dataset,
    view: Mutex<ViewState>,
}

impl ServerState {
    /// A fresh session over `dataset`
    #[must_use]
    pub fn new(dataset: &'static Dataset) -> Self {
        Self {
            dataset,
            view: Mutex::new(ViewState::default()),
        }
    }

    /// Current view state of the session
    pub fn view(&self) -> ViewState {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Body of the filter form
///
/// Unchecked checkboxes are absent. The map fields are empty until the map
/// has been moved.
#[derive(Debug, Default, Deserialize)]
pub struct InteractionForm {
    middle: Option<String>,
    high: Option<String>,
    public: Option<String>,
    private: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    zoom: Option<String>,
}

impl InteractionForm {
    /// What the user did, as seen by the session
    #[must_use]
    pub fn to_interaction(&self) -> Interaction {
        Interaction {
            flags: FilterFlags {
                show_middle: self.middle.is_some(),
                show_high: self.high.is_some(),
                show_public: self.public.is_some(),
                show_private: self.private.is_some(),
            },
            viewport: self.viewport(),
        }
    }

    fn viewport(&self) -> Option<Viewport> {
        let parse = |field: &Option<String>| {
            field
                .as_deref()
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite())
        };
        let lat = parse(&self.lat)?;
        let lon = parse(&self.lon)?;
        let zoom = parse(&self.zoom)?.round().clamp(0.0, f64::from(u8::MAX)) as u8;
        Some(Viewport {
            center: GeoPoint::new(lat, lon),
            zoom,
        })
    }
}

fn page(document: Result<MapDocument>) -> HttpResponse {
    match document.and_then(|document| document.to_html()) {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            log::error!("Failed to render map: {e}");
            HttpResponse::InternalServerError().body(e.to_string())
        }
    }
}

async fn index(state: web::Data<ServerState>) -> HttpResponse {
    let view = state.view();
    page(state.dataset.render(&view))
}

async fn interact(
    state: web::Data<ServerState>,
    form: web::Form<InteractionForm>,
) -> HttpResponse {
    let interaction = form.to_interaction();
    let mut view = state.view.lock().unwrap_or_else(PoisonError::into_inner);
    match state.dataset.render_step(*view, &interaction) {
        Ok((next, document)) => {
            *view = next;
            page(Ok(document))
        }
        Err(e) => page(Err(e)),
    }
}

/// Register the page routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/interact", web::post().to(interact));
}

/// Serve the map until the process is stopped
pub async fn serve(dataset: &'static Dataset) -> Result<()> {
    let address = dataset.config().bind_address.clone();
    let state = web::Data::new(ServerState::new(dataset));

    log::info!("Serving the IPS map on http://{address}");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .workers(1)
        .bind(address.as_str())?
        .run()
        .await?;
    Ok(())
}

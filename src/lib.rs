//! A session-authenticating API gateway in front of the meetup user, event
//! and auth services.

pub mod config;
pub mod context;
pub mod error;
pub mod response;
pub mod server;
pub mod state;

pub mod crypto {
    pub mod token;
}

pub mod models {
    pub mod event;
    pub mod session;
    pub mod user;
}

pub mod store;
pub mod managers;

pub mod rpc {
    pub mod messages;
    pub mod server;
}

pub mod services {
    pub mod auth;
    pub mod event;
    pub mod geocoder;
    pub mod local;
    pub mod notifier;
    pub mod remote;
    pub mod user;
}

pub mod handlers {
    pub mod auth;
    pub mod events;
    pub mod users;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod cors;
    pub mod csrf;
    pub mod logging;
    pub mod recovery;
    pub mod route_vars;
}

pub mod validation {
    pub mod input;
}

/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const AUTH_ROUTE_COMPONENT: &str = "auth";
pub const AUTH_ROUTE_PREFIX: &str = const_str::concat!(API_ROUTE_PREFIX, "/", AUTH_ROUTE_COMPONENT);

pub const CALENDAR_ROUTE_COMPONENT: &str = "calendars";
pub const CALENDAR_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", CALENDAR_ROUTE_COMPONENT);

pub const EVENT_ROUTE_COMPONENT: &str = "events";
pub const EVENT_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", EVENT_ROUTE_COMPONENT);

pub const INVITATION_ROUTE_COMPONENT: &str = "invitations";
pub const INVITATION_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", INVITATION_ROUTE_COMPONENT);

/// Frontend path (relative to `app.frontend_url`) that redeems a share token.
pub const FRONTEND_JOIN_PATH: &str = "/calendar/join";

/// Frontend path (relative to `app.frontend_url`) that accepts an invitation.
pub const FRONTEND_INVITATION_PATH: &str = "/calendar/invitation";

/// Maximum number of addresses accepted by a single invite request.
pub const MAX_INVITES_PER_REQUEST: usize = 10;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

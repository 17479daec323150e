//! `/api/calendars`: calendars and everything scoped to one.

mod calendar;
mod invitations;
mod members;
mod sharing;
mod tags;

use salvo::Router;

use sharecal_core::constants::CALENDAR_ROUTE_COMPONENT;

/// Static segments are pushed before `{id}` so they win the match.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(CALENDAR_ROUTE_COMPONENT)
        .get(calendar::list)
        .post(calendar::create)
        .push(Router::with_path("check").get(calendar::check))
        .push(Router::with_path("join").post(sharing::join))
        .push(Router::with_path("share").get(sharing::preview))
        .push(
            Router::with_path("{id}")
                .get(calendar::get)
                .patch(calendar::update)
                .delete(calendar::delete)
                .push(Router::with_path("stats").get(calendar::stats))
                .push(Router::with_path("leave").post(calendar::leave))
                .push(Router::with_path("events").get(calendar::events))
                .push(
                    Router::with_path("tags")
                        .get(tags::list)
                        .post(tags::create)
                        .put(tags::update_all)
                        .push(Router::with_path("reset").post(tags::reset))
                        .push(Router::with_path("{tag_id}").delete(tags::delete)),
                )
                .push(
                    Router::with_path("members")
                        .get(members::list)
                        .push(Router::with_path("{user_id}").delete(members::remove)),
                )
                .push(Router::with_path("change-role").post(members::change_role))
                .push(
                    Router::with_path("share-link")
                        .get(sharing::link)
                        .push(Router::with_path("regenerate").post(sharing::regenerate)),
                )
                .push(
                    Router::with_path("invitations")
                        .get(invitations::list)
                        .post(invitations::invite)
                        .push(Router::with_path("{invitation_id}").delete(invitations::cancel)),
                ),
        )
}

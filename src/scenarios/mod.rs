//! Built-in scenarios against the demo portal and storefront.
//!
//! Site roots come from the `${portal_url}` and `${storefront_url}`
//! variables, so the same definitions run against any configured host.

mod portal;
mod storefront;

use crate::scenario::Scenario;

pub fn all() -> Vec<Scenario> {
    vec![
        portal::login_success(),
        portal::login_invalid(),
        storefront::signup_login_contact(),
        storefront::browse_cart(),
        storefront::cart_remove_item(),
        storefront::purchase_new_user(),
        storefront::smoke_purchase(),
    ]
}

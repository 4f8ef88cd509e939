//! Shared page chrome and HTMX response helpers.

use axum::http::{HeaderName, HeaderValue};
use serde_json::{Map, Value};

use crate::cart::Notice;
use crate::models::CurrentUser;

/// Response header HTMX reads client-side events from.
pub const HX_TRIGGER: HeaderName = HeaderName::from_static("hx-trigger");

/// Event telling the navbar badge to refetch the cart count.
const CART_UPDATED_EVENT: &str = "cart-updated";

/// Event carrying a toast notification.
const NOTIFY_EVENT: &str = "notify";

/// Signed-in user as shown in the navbar.
#[derive(Clone)]
pub struct UserView {
    pub name: String,
    pub email: String,
}

/// Navbar data every full page renders.
#[derive(Clone)]
pub struct NavView {
    pub user: Option<UserView>,
    /// Section highlighted in the navbar.
    pub active: &'static str,
}

impl NavView {
    #[must_use]
    pub fn new(user: Option<&CurrentUser>, active: &'static str) -> Self {
        Self {
            user: user.map(|user| UserView {
                name: user.name.clone(),
                email: user.email.to_string(),
            }),
            active,
        }
    }
}

/// Build the `HX-Trigger` value for a cart response.
///
/// Header values must be visible ASCII, so anything else in the JSON
/// (including non-ASCII text in API messages) is `\u`-escaped.
#[must_use]
pub fn cart_trigger(cart_updated: bool, notice: Option<&Notice>) -> HeaderValue {
    let mut events = Map::new();
    if cart_updated {
        events.insert(CART_UPDATED_EVENT.to_string(), Value::Null);
    }
    if let Some(notice) = notice {
        events.insert(
            NOTIFY_EVENT.to_string(),
            serde_json::to_value(notice).unwrap_or(Value::Null),
        );
    }

    HeaderValue::from_str(&ascii_json(&Value::Object(events)))
        .unwrap_or_else(|_| HeaderValue::from_static(CART_UPDATED_EVENT))
}

fn ascii_json(value: &Value) -> String {
    let raw = value.to_string();
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii() && c != '\x7f' {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(value: &HeaderValue) -> Value {
        serde_json::from_str(value.to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_cart_trigger_events() {
        let value = cart_trigger(true, Some(&Notice::success("Item removed")));
        let events = parse(&value);
        assert!(events.get("cart-updated").unwrap().is_null());
        assert_eq!(events["notify"]["level"], "success");
        assert_eq!(events["notify"]["message"], "Item removed");

        let events = parse(&cart_trigger(false, Some(&Notice::error("Failed"))));
        assert!(events.get("cart-updated").is_none());
        assert_eq!(events["notify"]["level"], "error");
    }

    #[test]
    fn test_cart_trigger_escapes_non_ascii() {
        let value = cart_trigger(false, Some(&Notice::error("المنتج غير موجود")));
        assert!(value.to_str().is_ok());
        assert_eq!(parse(&value)["notify"]["message"], "المنتج غير موجود");
    }
}

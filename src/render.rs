//! Capability interface for template helpers.
//!
//! A [`RenderHost`] exposes a fixed set of operations; [`Helper`] forwards exactly
//! those, so helpers never dispatch on names at runtime.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

pub trait RenderHost {
    /// Configuration value at `name` (slash separated), or `default`.
    fn config(&self, name: &str, default: Option<JsonValue>) -> Option<JsonValue>;

    fn date(&self, date: &str) -> String;

    fn number(&self, number: f64, decimals: usize) -> String;

    /// Request parameter value, or `default`.
    fn param(&self, name: &str, default: Option<&str>) -> Option<String>;

    /// HTML form field name for a parameter path.
    fn form_param(&self, names: &[&str]) -> String;

    fn partial(&self, path: &str, params: &Map<String, JsonValue>) -> String;

    fn translate(&self, domain: &str, singular: &str, plural: Option<&str>, count: u64) -> String;

    fn url(
        &self,
        target: Option<&str>,
        controller: Option<&str>,
        action: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> String;
}

/// Thin typed adapter over a render host.
#[derive(Debug, Clone)]
pub struct Helper<V: RenderHost> {
    view: V,
}

impl<V: RenderHost> Helper<V> {
    pub fn new(view: V) -> Self {
        Self { view }
    }

    pub fn set_view(&mut self, view: V) -> &mut Self {
        self.view = view;
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn config(&self, name: &str, default: Option<JsonValue>) -> Option<JsonValue> {
        self.view.config(name, default)
    }

    pub fn date(&self, date: &str) -> String {
        self.view.date(date)
    }

    pub fn number(&self, number: f64, decimals: usize) -> String {
        self.view.number(number, decimals)
    }

    pub fn param(&self, name: &str, default: Option<&str>) -> Option<String> {
        self.view.param(name, default)
    }

    pub fn form_param(&self, names: &[&str]) -> String {
        self.view.form_param(names)
    }

    pub fn partial(&self, path: &str, params: &Map<String, JsonValue>) -> String {
        self.view.partial(path, params)
    }

    pub fn translate(
        &self,
        domain: &str,
        singular: &str,
        plural: Option<&str>,
        count: u64,
    ) -> String {
        self.view.translate(domain, singular, plural, count)
    }

    pub fn url(
        &self,
        target: Option<&str>,
        controller: Option<&str>,
        action: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> String {
        self.view.url(target, controller, action, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StubHost {
        locale: &'static str,
    }

    impl RenderHost for StubHost {
        fn config(&self, name: &str, default: Option<JsonValue>) -> Option<JsonValue> {
            match name {
                "client/html/locale" => Some(json!(self.locale)),
                _ => default,
            }
        }

        fn date(&self, date: &str) -> String {
            format!("{}:{date}", self.locale)
        }

        fn number(&self, number: f64, decimals: usize) -> String {
            format!("{number:.decimals$}")
        }

        fn param(&self, _name: &str, default: Option<&str>) -> Option<String> {
            default.map(str::to_string)
        }

        fn form_param(&self, names: &[&str]) -> String {
            match names.split_first() {
                Some((first, rest)) => {
                    let tail: String = rest.iter().map(|n| format!("[{n}]")).collect();
                    format!("{first}{tail}")
                }
                None => String::new(),
            }
        }

        fn partial(&self, path: &str, params: &Map<String, JsonValue>) -> String {
            format!("{path}({})", params.len())
        }

        fn translate(
            &self,
            _domain: &str,
            singular: &str,
            plural: Option<&str>,
            count: u64,
        ) -> String {
            match plural {
                Some(plural) if count != 1 => plural.to_string(),
                _ => singular.to_string(),
            }
        }

        fn url(
            &self,
            target: Option<&str>,
            controller: Option<&str>,
            action: Option<&str>,
            params: &BTreeMap<String, String>,
        ) -> String {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!(
                "/{}/{}/{}?{}",
                target.unwrap_or(""),
                controller.unwrap_or(""),
                action.unwrap_or(""),
                query.join("&")
            )
        }
    }

    #[test]
    fn forwards_every_capability() {
        let mut helper = Helper::new(StubHost { locale: "de" });
        assert_eq!(helper.config("client/html/locale", None), Some(json!("de")));
        assert_eq!(helper.config("missing", Some(json!(1))), Some(json!(1)));
        assert_eq!(helper.number(3.14159, 2), "3.14");
        assert_eq!(helper.form_param(&["b", "address", "city"]), "b[address][city]");
        assert_eq!(helper.translate("client", "item", Some("items"), 3), "items");
        assert_eq!(helper.param("page", Some("1")), Some("1".into()));
        assert_eq!(helper.partial("common/summary", &Map::new()), "common/summary(0)");

        let params: BTreeMap<String, String> = [("id".to_string(), "7".to_string())].into();
        assert_eq!(
            helper.url(Some("shop"), Some("catalog"), Some("detail"), &params),
            "/shop/catalog/detail?id=7"
        );

        helper.set_view(StubHost { locale: "en" });
        assert_eq!(helper.date("2024-01-01"), "en:2024-01-01");
        assert_eq!(helper.view().locale, "en");
    }
}

use flagboard::preferences;
use flagboard::provider::SharedCache;
use flagboard::storage::DurableStorage;
use flagboard::utils::SearchPattern;
use gloo_timers::callback::Interval;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Holds a preference value and the callbacks that update it.
#[derive(Clone)]
pub struct PersistedState<T: Clone + PartialEq + 'static> {
    /// The current value.
    pub value: T,
    /// Replace the value and write it to its storage slot.
    pub set: Callback<T>,
}

/// State mirrored into one storage slot. The slot is read once on mount; a
/// missing or malformed value yields `default`.
#[hook]
pub fn use_persisted<T>(
    storage: Rc<dyn DurableStorage>,
    key: &'static str,
    default: T,
) -> PersistedState<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + 'static,
{
    let state = {
        let storage = storage.clone();
        use_state(move || preferences::load_or(&*storage, key, default))
    };

    let set = {
        let state = state.clone();
        Callback::from(move |value: T| {
            preferences::save(&*storage, key, &value);
            state.set(value);
        })
    };

    PersistedState {
        value: (*state).clone(),
        set,
    }
}

/// Search box state: raw text (persisted) plus the pattern compiled from it
/// on every change.
#[derive(Clone)]
pub struct SearchInput {
    pub text: String,
    pub pattern: Rc<SearchPattern>,
    pub on_input: Callback<InputEvent>,
}

#[hook]
pub fn use_search_input(storage: Rc<dyn DurableStorage>, key: &'static str) -> SearchInput {
    let text = use_persisted(storage, key, String::new());
    let pattern = use_memo(text.value.clone(), |t| SearchPattern::compile(t));

    let on_input = {
        let set = text.set.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            set.emit(input.value());
        })
    };

    SearchInput {
        text: text.value,
        pattern,
        on_input,
    }
}

async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let window = web_sys::window().ok_or("no window")?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("{:?}", e))?;
    let response: web_sys::Response = response.dyn_into().map_err(|e| format!("{:?}", e))?;
    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }
    let body = JsFuture::from(response.json().map_err(|e| format!("{:?}", e))?)
        .await
        .map_err(|e| format!("{:?}", e))?;
    serde_wasm_bindgen::from_value(body).map_err(|e| e.to_string())
}

/// Stale-while-revalidate snapshot: starts from the cached response, then
/// polls `url` and replaces both the state and the cache entry whenever a
/// fresh snapshot arrives.
#[hook]
pub fn use_snapshot<T>(cache: SharedCache, url: String, interval_ms: u32) -> Option<Rc<T>>
where
    T: Serialize + DeserializeOwned + 'static,
{
    let snapshot = {
        let cache = cache.clone();
        let url = url.clone();
        use_state(move || cache.get::<T>(&url).map(Rc::new))
    };

    {
        let snapshot = snapshot.clone();
        use_effect_with(url, move |url| {
            let refresh = {
                let url = url.clone();
                move || {
                    let url = url.clone();
                    let cache = cache.clone();
                    let snapshot = snapshot.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        match fetch_json::<T>(&url).await {
                            Ok(fresh) => {
                                debug!("Fetched fresh snapshot from {}", url);
                                cache.insert(url, &fresh);
                                snapshot.set(Some(Rc::new(fresh)));
                            }
                            Err(e) => warn!("Failed to refresh {}: {}", url, e),
                        }
                    });
                }
            };
            refresh();
            let interval = Interval::new(interval_ms, refresh);
            move || drop(interval)
        });
    }

    (*snapshot).clone()
}

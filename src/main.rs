//! Main module for the flagboard front end using Yew.
//! Wires the response cache, snapshot polling, preferences and views.

use flagboard::cache::LocalCacheStore;
use flagboard::challenge::{derive_board, BloodPalette, CategoryScope, FilterCriteria};
use flagboard::config::*;
use flagboard::marks::{ChallengeMarks, Mark};
use flagboard::model::{ChallengeCategory, ChallengeId, GameTeamInfo, ScoreboardSnapshot};
use flagboard::preferences;
use flagboard::provider::{BrowserLifecycle, ResponseCacheProvider, SharedCache};
use flagboard::scoreboard::{organizations, OrganizationScope, ScoreboardViewState};
use flagboard::storage::{BrowserStorage, DurableStorage, MemoryStorage};
use gloo_events::EventListener;
use log::{info, warn};
use std::rc::Rc;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

mod components;
mod hooks;

use components::{render_board, render_tabs, CacheInfo, MobileScoreboard, ScoreboardTable};
use hooks::{use_persisted, use_search_input, use_snapshot};

// ──────────────────────────────────────────────────────────────────────────────
// Type aliases for better readability
type Storage = Rc<dyn DurableStorage>;
type Provider = ResponseCacheProvider<Storage, BrowserLifecycle>;

const MOBILE_WIDTH_PX: f64 = 1080.0;

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Browser storage, or process memory when it is disabled.
fn open_storage() -> Storage {
    match BrowserStorage::local() {
        Ok(storage) => Rc::new(storage),
        Err(e) => {
            warn!("{}; preferences and cache will not survive a reload", e);
            Rc::new(MemoryStorage::new())
        }
    }
}

/// Game id from the `game` query parameter, defaulting to 1.
fn game_id_from_location() -> u32 {
    let search = gloo_utils::window().location().search().unwrap_or_default();
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == "game")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}

fn endpoint(template: &str, game_id: u32) -> String {
    template.replace("{}", &game_id.to_string())
}

fn window_is_narrow() -> bool {
    gloo_utils::window()
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .is_some_and(|w| w < MOBILE_WIDTH_PX)
}

// ──────────────────────────────────────────────────────────────────────────────

#[derive(Properties)]
struct PanelProps {
    storage: Storage,
    cache: SharedCache,
    game_id: u32,
}

impl PartialEq for PanelProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
            && self.cache == other.cache
            && self.game_id == other.game_id
    }
}

/// Challenge panel: filters on the left, derived board on the right.
#[function_component(ChallengePanel)]
fn challenge_panel(props: &PanelProps) -> Html {
    let team_info: Option<Rc<GameTeamInfo>> = use_snapshot(
        props.cache.clone(),
        endpoint(TEAM_INFO_ENDPOINT, props.game_id),
        POLL_INTERVAL_MS,
    );
    let hide_solved = use_persisted(props.storage.clone(), HIDE_SOLVED_KEY, false);
    let hide_week = use_persisted(props.storage.clone(), HIDE_WEEK_IN_TITLE_KEY, false);
    let search = use_search_input(props.storage.clone(), CHALLENGE_SEARCH_KEY);
    let marks = {
        let storage = props.storage.clone();
        use_state(move || preferences::load_marks(&*storage))
    };
    let scope = use_state(CategoryScope::default);

    let on_mark = {
        let marks = marks.clone();
        let storage = props.storage.clone();
        Callback::from(move |(id, mark): (ChallengeId, Option<Mark>)| {
            let mut updated: ChallengeMarks = (*marks).clone();
            match mark {
                Some(mark) => updated.set(id, mark),
                None => {
                    updated.clear(id);
                }
            }
            preferences::save_marks(&*storage, &updated);
            marks.set(updated);
        })
    };

    let criteria = FilterCriteria {
        scope: *scope,
        hide_solved: hide_solved.value,
        hide_week_in_title: hide_week.value,
        search: (*search.pattern).clone(),
    };
    let info = team_info.as_deref();
    let board = derive_board(
        info.and_then(|i| i.challenges.as_ref()),
        info.and_then(|i| i.rank.as_ref()),
        &marks,
        &criteria,
        &BloodPalette::default(),
    );

    let toggle = |handle: &hooks::PersistedState<bool>| {
        let set = handle.set.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            set.emit(input.checked());
        })
    };
    let on_tab = {
        let scope = scope.clone();
        Callback::from(move |s: CategoryScope| scope.set(s))
    };

    html! {
        <div class="challenge-panel">
            <div class="panel-controls">
                <label>
                    <input type="checkbox" checked={hide_solved.value} onchange={toggle(&hide_solved)} />
                    { "Hide solved" }
                </label>
                <label>
                    <input type="checkbox" checked={hide_week.value} onchange={toggle(&hide_week)} />
                    { "Hide week in title" }
                </label>
                <input
                    class={classes!("challenge-search", board.search.is_error().then_some("error"))}
                    placeholder="Search challenges"
                    value={search.text.clone()}
                    oninput={search.on_input.clone()}
                />
                <div class="tabs">{ render_tabs(&board.tabs, *scope, &on_tab) }</div>
            </div>
            <div class="panel-board">{ render_board(&board, &on_mark) }</div>
        </div>
    }
}

/// Scoreboard page: one view state feeding the full and the compact table.
#[function_component(Scoreboard)]
fn scoreboard(props: &PanelProps) -> Html {
    let snapshot: Option<Rc<ScoreboardSnapshot>> = use_snapshot(
        props.cache.clone(),
        endpoint(SCOREBOARD_ENDPOINT, props.game_id),
        POLL_INTERVAL_MS,
    );
    let view_state = {
        let storage = props.storage.clone();
        use_state(move || ScoreboardViewState::new(&preferences::load_scoreboard_search(&*storage)))
    };
    let narrow = use_state(window_is_narrow);

    {
        let narrow = narrow.clone();
        use_effect_with((), move |_| {
            let listener = EventListener::new(&gloo_utils::window(), "resize", move |_| {
                narrow.set(window_is_narrow());
            });
            move || drop(listener)
        });
    }

    let on_organization = {
        let view_state = view_state.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            let mut next = (*view_state).clone();
            next.set_organization(OrganizationScope::parse(&select.value()));
            view_state.set(next);
        })
    };
    let on_category = {
        let view_state = view_state.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            let mut next = (*view_state).clone();
            next.set_category(select.value().parse::<ChallengeCategory>().ok());
            view_state.set(next);
        })
    };
    let on_title = {
        let view_state = view_state.clone();
        let storage = props.storage.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let text = input.value();
            preferences::save(&*storage, SCOREBOARD_SEARCH_KEY, &text);
            let mut next = (*view_state).clone();
            next.set_title_pattern(&text);
            view_state.set(next);
        })
    };

    let Some(snapshot) = snapshot else {
        return html! { <p class="board-message">{ "Loading scoreboard..." }</p> };
    };
    let view = view_state.derive(&snapshot);

    html! {
        <div class="scoreboard">
            <div class="scoreboard-filters">
                <select onchange={on_organization}>
                    <option value={ALL_ORGANIZATIONS}>{ "All organizations" }</option>
                    { organizations(&snapshot).into_iter().map(|org| html! {
                        <option value={org.clone()}>{ org }</option>
                    }).collect::<Html>() }
                </select>
                <select onchange={on_category}>
                    <option value="">{ "All categories" }</option>
                    { snapshot.challenges.keys().map(|category| html! {
                        <option value={category.to_string()}>{ category.to_string() }</option>
                    }).collect::<Html>() }
                </select>
                <input
                    class={classes!(view.search.is_error().then_some("error"))}
                    placeholder="Filter challenges"
                    value={view_state.title_text().to_string()}
                    oninput={on_title}
                />
            </div>
            if *narrow {
                <MobileScoreboard rows={view.compact_rows()} />
            } else {
                <ScoreboardTable view={view.clone()} />
            }
        </div>
    }
}

/// Root component: owns the response cache provider for the app's lifetime.
#[function_component]
pub fn App() -> Html {
    let storage = use_memo((), |_| open_storage());
    let game_id = use_memo((), |_| game_id_from_location());
    let provider = {
        let storage = (*storage).clone();
        use_mut_ref(move || {
            let mut provider: Provider =
                ResponseCacheProvider::new(LocalCacheStore::new(storage), BrowserLifecycle);
            provider.register();
            provider
        })
    };
    let cache = provider.borrow().cache();

    {
        let provider = provider.clone();
        use_effect_with((), move |_| move || provider.borrow_mut().dispose());
    }

    let on_clear = {
        let provider = provider.clone();
        Callback::from(move |_: ()| provider.borrow_mut().invalidate())
    };

    html! {
        <div class="app">
            <CacheInfo total={cache.len()} on_clear={on_clear} />
            <ChallengePanel storage={(*storage).clone()} cache={cache.clone()} game_id={*game_id} />
            <Scoreboard storage={(*storage).clone()} cache={cache} game_id={*game_id} />
        </div>
    }
}

/// Entry point: installs the panic hook and starts the Yew renderer.
fn main() {
    console_error_panic_hook::set_once();
    info!("Starting flagboard");
    yew::Renderer::<App>::new().render();
}

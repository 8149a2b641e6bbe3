//! Yew view components for challenge cards and scoreboards.
//!
//! Components only render what the engine derived; no filtering happens here.

use flagboard::challenge::{BloodBadge, BoardState, CategoryScope, CategoryTab, ChallengeBoard, ChallengeView};
use flagboard::marks::{Mark, MarkGlyph, MarkKind};
use flagboard::model::{ChallengeId, SubmissionType};
use flagboard::scoreboard::{CompactRow, ScoreboardView};
use flagboard::utils::format_submit_time;
use web_sys::HtmlSelectElement;
use yew::prelude::*;

fn render_blood(badge: &BloodBadge) -> Html {
    let tooltip = match &badge.submit_time_utc {
        Some(time) => format!("{}\n{}", badge.team_name, format_submit_time(time)),
        None => badge.team_name.clone(),
    };
    let class = classes!("blood", badge.own_team.then_some("blood-own"));
    html! {
        <span {class} title={tooltip} style={format!("--blood-color: {}", badge.style.color)}>
            <i class={classes!("mdi", badge.style.icon.clone())} />
        </span>
    }
}

fn render_glyph(glyph: &MarkGlyph) -> Html {
    match glyph {
        MarkGlyph::Flag => html! { <i class="mdi mdi-flag" /> },
        MarkGlyph::Icon(icon) => html! { <i class={classes!("mdi", *icon)} /> },
        MarkGlyph::Text(text) => html! { <span class="mark-text">{ text }</span> },
    }
}

#[derive(Properties, PartialEq)]
pub struct ChallengeCardProps {
    pub view: ChallengeView,
    pub on_mark: Callback<(ChallengeId, Option<Mark>)>,
}

#[function_component(ChallengeCard)]
pub fn challenge_card(props: &ChallengeCardProps) -> Html {
    let view = &props.view;

    let onchange = {
        let on_mark = props.on_mark.clone();
        let id = view.id;
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            let value = select.value();
            let mark = (!value.is_empty()).then(|| Mark::parse(&value));
            on_mark.emit((id, mark));
        })
    };

    html! {
        <div class={classes!("challenge-card", view.darkened.then_some("solved"))}>
            <div class="challenge-title">{ &view.display_title }</div>
            <div class="challenge-score">{ format!("{} pts", view.score) }</div>
            <div class="challenge-solved">{ format!("{} solved", view.solved_count) }</div>
            if !view.bloods.is_empty() {
                <div class="bloods">
                    { view.bloods.iter().map(render_blood).collect::<Html>() }
                </div>
            }
            if view.mark.show {
                <div class="mark">{ render_glyph(&view.mark.glyph) }</div>
            }
            <select class="mark-picker" {onchange}>
                <option value="">{ "-" }</option>
                { MarkKind::all().map(|kind| html! {
                    <option value={kind.label()}>{ kind.label() }</option>
                }).collect::<Html>() }
            </select>
        </div>
    }
}

/// Renders the challenge grid, or the message for a board that is not ready.
pub fn render_board(board: &ChallengeBoard, on_mark: &Callback<(ChallengeId, Option<Mark>)>) -> Html {
    match &board.state {
        BoardState::Loading => html! { <p class="board-message">{ "Loading challenges..." }</p> },
        BoardState::NoChallenges => {
            html! { <p class="board-message">{ "This game has no challenges yet." }</p> }
        }
        BoardState::ScoreboardNotReady => html! {
            <div class="board-message">
                <h2>{ "Scoreboard not ready" }</h2>
                <p>{ "Challenges appear once the scoreboard has been published." }</p>
            </div>
        },
        BoardState::AllSolved => html! {
            <div class="board-message">
                <h2>{ "All solved" }</h2>
                <p>{ "Nothing left under the current filters." }</p>
            </div>
        },
        BoardState::Ready(views) => html! {
            <div class="challenge-grid">
                { views.iter().map(|view| html! {
                    <ChallengeCard key={view.id} view={view.clone()} on_mark={on_mark.clone()} />
                }).collect::<Html>() }
            </div>
        },
    }
}

/// Category tabs with counts.
pub fn render_tabs(tabs: &[CategoryTab], active: CategoryScope, on_select: &Callback<CategoryScope>) -> Html {
    tabs.iter()
        .map(|tab| {
            let label = match tab.scope {
                CategoryScope::All => "All".to_string(),
                CategoryScope::Only(category) => category.to_string(),
            };
            let scope = tab.scope;
            let onclick = on_select.reform(move |_: MouseEvent| scope);
            html! {
                <button class={classes!("tab", (tab.scope == active).then_some("active"))} {onclick}>
                    <span>{ label }</span>
                    <span class="tab-count">{ tab.count }</span>
                </button>
            }
        })
        .collect()
}

fn cell_symbol(cell: Option<SubmissionType>) -> &'static str {
    match cell {
        Some(SubmissionType::FirstBlood) => "🥇",
        Some(SubmissionType::SecondBlood) => "🥈",
        Some(SubmissionType::ThirdBlood) => "🥉",
        Some(SubmissionType::Normal) => "✔",
        Some(SubmissionType::Unaccepted) | None => "",
    }
}

#[derive(Properties, PartialEq)]
pub struct ScoreboardTableProps {
    pub view: ScoreboardView,
}

#[function_component(ScoreboardTable)]
pub fn scoreboard_table(props: &ScoreboardTableProps) -> Html {
    let view = &props.view;
    html! {
        <table class="scoreboard-table">
            <thead>
                <tr>
                    <th>{ "Rank" }</th>
                    <th>{ "Team" }</th>
                    <th>{ "Score" }</th>
                    { view.columns.iter().map(|c| html! {
                        <th title={c.category.to_string()}>{ &c.title }</th>
                    }).collect::<Html>() }
                </tr>
            </thead>
            <tbody>
                { view.rows.iter().map(|row| html! {
                    <tr key={row.team_id}>
                        <td>{ row.rank }</td>
                        <td>{ &row.name }</td>
                        <td>{ row.score }</td>
                        { row.cells.iter().map(|cell| html! {
                            <td>{ cell_symbol(*cell) }</td>
                        }).collect::<Html>() }
                    </tr>
                }).collect::<Html>() }
            </tbody>
        </table>
    }
}

#[derive(Properties, PartialEq)]
pub struct MobileScoreboardProps {
    pub rows: Vec<CompactRow>,
}

#[function_component(MobileScoreboard)]
pub fn mobile_scoreboard(props: &MobileScoreboardProps) -> Html {
    html! {
        <ul class="scoreboard-compact">
            { props.rows.iter().map(|row| html! {
                <li key={row.team_id}>
                    <span class="rank">{ format!("#{}", row.rank) }</span>
                    <span class="name">{ &row.name }</span>
                    <span class="score">{ format!("{} pts / {} solved", row.score, row.solved_count) }</span>
                </li>
            }).collect::<Html>() }
        </ul>
    }
}

/// Displays the number of cached responses and the clear-cache action.
#[derive(Properties, PartialEq)]
pub struct CacheInfoProps {
    pub total: usize,
    pub on_clear: Callback<()>,
}

#[function_component(CacheInfo)]
pub fn cache_info(props: &CacheInfoProps) -> Html {
    let onclick = props.on_clear.reform(|_: MouseEvent| ());
    html! {
        <div class="cache-info-container">
            <div class="cache-status-global">
                { format!("Cached responses: {}", props.total) }
            </div>
            <button class="clear-cache" {onclick}>{ "Clear cache and reload" }</button>
        </div>
    }
}

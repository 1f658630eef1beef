// tests/navigator_test.rs
//
// Drives the background navigator through an in-memory browser.

use std::cell::{Cell, RefCell};

use futures::executor::block_on;

use voice_navigator::command::{Action, Direction, ScrollAmount};
use voice_navigator::config::NavigatorConfig;
use voice_navigator::dispatch::{BrowserHost, DispatchError, TabId, TabInfo};
use voice_navigator::error::HostError;
use voice_navigator::navigator::VoiceOutcome;
use voice_navigator::protocol::{Broadcaster, Inbound, Outbound, PageOp, Reply, Status, StatusSnapshot};
use voice_navigator::session::{SurfaceHandle, SurfaceHost, SurfaceKind};
use voice_navigator::settings::{Settings, SettingsPatch, SettingsStore};
use voice_navigator::Navigator;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Activate(TabId),
    Close(TabId),
    Reload(TabId),
    Open(String),
    Navigate(TabId, String),
    Page(TabId, PageOp),
    OpenSurface(SurfaceHandle),
    CloseSurface(SurfaceHandle),
}

#[derive(Default)]
struct FakeBrowser {
    tabs: RefCell<Vec<TabInfo>>,
    next_id: Cell<i32>,
    /// Whether a text field has focus in the active page.
    field_focused: Cell<bool>,
    page_unreachable: Cell<bool>,
    settings: RefCell<Settings>,
    surfaces: RefCell<Vec<SurfaceHandle>>,
    calls: RefCell<Vec<Call>>,
    broadcasts: RefCell<Vec<Outbound>>,
}

impl FakeBrowser {
    /// `count` tabs with ids 1..=count; `active` is a 0-based position.
    fn with_tabs(count: i32, active: usize) -> Self {
        let browser = FakeBrowser::default();
        *browser.tabs.borrow_mut() = (1..=count)
            .map(|id| TabInfo { id, active: id as usize == active + 1, url: None })
            .collect();
        browser.next_id.set(count);
        browser
    }

    fn next_id(&self) -> i32 {
        self.next_id.set(self.next_id.get() + 1);
        self.next_id.get()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn broadcasts(&self) -> Vec<Outbound> {
        self.broadcasts.borrow().clone()
    }

    fn surface_opens(&self) -> usize {
        self.calls.borrow().iter().filter(|call| matches!(call, Call::OpenSurface(_))).count()
    }
}

impl BrowserHost for FakeBrowser {
    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>, HostError> {
        Ok(self.tabs.borrow().clone())
    }

    async fn activate_tab(&self, id: TabId) -> Result<(), HostError> {
        for tab in self.tabs.borrow_mut().iter_mut() {
            tab.active = tab.id == id;
        }
        self.record(Call::Activate(id));
        Ok(())
    }

    async fn close_tab(&self, id: TabId) -> Result<(), HostError> {
        self.tabs.borrow_mut().retain(|tab| tab.id != id);
        self.record(Call::Close(id));
        Ok(())
    }

    async fn reload_tab(&self, id: TabId) -> Result<(), HostError> {
        self.record(Call::Reload(id));
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> Result<TabId, HostError> {
        let id = self.next_id();
        for tab in self.tabs.borrow_mut().iter_mut() {
            tab.active = false;
        }
        self.tabs.borrow_mut().push(TabInfo { id, active: true, url: Some(url.to_string()) });
        self.record(Call::Open(url.to_string()));
        Ok(id)
    }

    async fn navigate_tab(&self, id: TabId, url: &str) -> Result<(), HostError> {
        self.record(Call::Navigate(id, url.to_string()));
        Ok(())
    }

    async fn run_in_tab(&self, id: TabId, op: &PageOp) -> Result<bool, HostError> {
        if self.page_unreachable.get() {
            return Err(HostError::PageUnreachable {
                tab_id: id,
                message: "Could not establish connection. Receiving end does not exist.".to_string(),
            });
        }
        self.record(Call::Page(id, op.clone()));
        Ok(match op {
            PageOp::InsertText { .. } => self.field_focused.get(),
            _ => true,
        })
    }
}

impl SurfaceHost for FakeBrowser {
    async fn find_surface(&self, kind: SurfaceKind, _url: &str) -> Result<Option<SurfaceHandle>, HostError> {
        Ok(self.surfaces.borrow().iter().copied().find(|handle| handle.kind == kind))
    }

    async fn open_surface(&self, kind: SurfaceKind, _url: &str) -> Result<SurfaceHandle, HostError> {
        let handle = SurfaceHandle { kind, id: self.next_id() };
        self.surfaces.borrow_mut().push(handle);
        self.record(Call::OpenSurface(handle));
        Ok(handle)
    }

    async fn close_surface(&self, handle: SurfaceHandle) -> Result<(), HostError> {
        self.surfaces.borrow_mut().retain(|h| *h != handle);
        self.record(Call::CloseSurface(handle));
        Ok(())
    }
}

impl SettingsStore for FakeBrowser {
    async fn load(&self) -> Result<Settings, HostError> {
        Ok(self.settings.borrow().clone())
    }

    async fn store(&self, patch: SettingsPatch) -> Result<(), HostError> {
        patch.apply_to(&mut self.settings.borrow_mut());
        Ok(())
    }
}

impl Broadcaster for FakeBrowser {
    fn broadcast(&self, message: &Outbound) {
        self.broadcasts.borrow_mut().push(message.clone());
    }
}

fn navigator(browser: FakeBrowser) -> Navigator<FakeBrowser> {
    Navigator::new(browser, NavigatorConfig::default())
}

fn say(navigator: &Navigator<FakeBrowser>, text: &str) -> VoiceOutcome {
    block_on(navigator.handle_voice_input(text))
}

fn send(navigator: &Navigator<FakeBrowser>, json: &str) -> Option<Reply> {
    let message: Inbound = serde_json::from_str(json).expect("valid inbound message");
    block_on(navigator.handle_message(message))
}

fn enable_dictation(navigator: &Navigator<FakeBrowser>) {
    navigator.host().settings.borrow_mut().dictation = Some(true);
}

#[test]
fn test_scroll_commands_run_in_active_page() {
    let nav = navigator(FakeBrowser::with_tabs(2, 1));
    assert_eq!(
        say(&nav, "Scroll Down 3"),
        VoiceOutcome::Executed(Action::ScrollBy { direction: Direction::Down, amount: Some(ScrollAmount::Pixels(3)) })
    );
    say(&nav, "scroll to top");
    assert_eq!(
        nav.host().calls(),
        vec![
            Call::Page(2, PageOp::ScrollBy { direction: Direction::Down, amount: Some(ScrollAmount::Pixels(3)) }),
            Call::Page(2, PageOp::ScrollToEdge { edge: voice_navigator::command::Edge::Top }),
        ]
    );
}

#[test]
fn test_link_hints_round_trip_through_page() {
    let nav = navigator(FakeBrowser::with_tabs(1, 0));
    say(&nav, "show links");
    say(&nav, "click link 2");
    say(&nav, "hide links");
    assert_eq!(
        nav.host().calls(),
        vec![
            Call::Page(1, PageOp::ShowLinkHints),
            Call::Page(1, PageOp::ClickLink { index: 2 }),
            Call::Page(1, PageOp::HideLinkHints),
        ]
    );
}

#[test]
fn test_relative_tab_switch_wraps_both_ways() {
    let nav = navigator(FakeBrowser::with_tabs(3, 2));
    say(&nav, "next tab");
    assert_eq!(nav.host().calls(), vec![Call::Activate(1)]);

    say(&nav, "previous tab");
    assert_eq!(nav.host().calls().last(), Some(&Call::Activate(3)));
}

#[test]
fn test_absolute_tab_switch_ignores_out_of_range() {
    let nav = navigator(FakeBrowser::with_tabs(3, 0));
    assert_eq!(say(&nav, "tab 2"), VoiceOutcome::Executed(Action::SwitchTabAbsolute(1)));
    assert_eq!(nav.host().calls(), vec![Call::Activate(2)]);

    assert_eq!(
        say(&nav, "switch tab 9"),
        VoiceOutcome::Skipped {
            action: Action::SwitchTabAbsolute(8),
            reason: DispatchError::TabOutOfRange { index: 8, count: 3 },
        }
    );
    assert!(matches!(say(&nav, "tab 0"), VoiceOutcome::Skipped { .. }));
    assert_eq!(nav.host().calls().len(), 1);
}

#[test]
fn test_tab_management_commands() {
    let nav = navigator(FakeBrowser::with_tabs(2, 0));
    say(&nav, "reload");
    say(&nav, "close tab");
    say(&nav, "new tab");
    assert_eq!(
        nav.host().calls(),
        vec![Call::Reload(1), Call::Close(1), Call::Open("chrome://newtab".to_string())]
    );
}

#[test]
fn test_close_without_active_tab_is_skipped() {
    let nav = navigator(FakeBrowser::default());
    assert_eq!(
        say(&nav, "close tab"),
        VoiceOutcome::Skipped { action: Action::CloseActiveTab, reason: DispatchError::NoActiveTab }
    );
    assert!(nav.host().calls().is_empty());
}

#[test]
fn test_relative_switch_without_active_tab_is_skipped() {
    let nav = navigator(FakeBrowser::with_tabs(3, 0));
    for tab in nav.host().tabs.borrow_mut().iter_mut() {
        tab.active = false;
    }
    assert_eq!(
        say(&nav, "next tab"),
        VoiceOutcome::Skipped { action: Action::SwitchTabRelative(1), reason: DispatchError::NoActiveTab }
    );
    assert_eq!(
        say(&nav, "previous tab"),
        VoiceOutcome::Skipped { action: Action::SwitchTabRelative(-1), reason: DispatchError::NoActiveTab }
    );
    assert!(!nav.host().calls().iter().any(|call| matches!(call, Call::Activate(_))));
}

#[test]
fn test_open_navigates_active_tab_or_opens_one() {
    let nav = navigator(FakeBrowser::with_tabs(1, 0));
    say(&nav, "open example.com");
    assert_eq!(nav.host().calls(), vec![Call::Navigate(1, "https://example.com".to_string())]);

    let nav = navigator(FakeBrowser::default());
    say(&nav, "open cute cats");
    assert_eq!(
        nav.host().calls(),
        vec![Call::Open("https://www.google.com/search?q=cute%20cats".to_string())]
    );
}

#[test]
fn test_unrecognized_reports_unknown_status() {
    let nav = navigator(FakeBrowser::with_tabs(1, 0));
    let outcome = say(&nav, "Asdkfj  Qwe");
    assert!(matches!(
        outcome,
        VoiceOutcome::Skipped { reason: DispatchError::Unrecognized(_), .. }
    ));
    assert_eq!(
        nav.host().broadcasts(),
        vec![Outbound::UiStatus { status: Status::Unknown("Asdkfj  Qwe".to_string()) }]
    );
    assert!(nav.host().calls().is_empty());
    // Unknown status is shown, not persisted.
    assert_eq!(nav.host().settings.borrow().status, None);
}

#[test]
fn test_blank_input_is_ignored() {
    let nav = navigator(FakeBrowser::with_tabs(1, 0));
    assert_eq!(say(&nav, "   "), VoiceOutcome::Ignored);
    assert!(nav.host().calls().is_empty());
    assert!(nav.host().broadcasts().is_empty());
}

#[test]
fn test_dictation_types_into_focused_field() {
    let nav = navigator(FakeBrowser::with_tabs(2, 0));
    enable_dictation(&nav);
    nav.host().field_focused.set(true);

    assert_eq!(say(&nav, "next tab"), VoiceOutcome::Dictated);
    assert_eq!(
        nav.host().calls(),
        vec![Call::Page(1, PageOp::InsertText { text: "next tab".to_string() })]
    );
}

#[test]
fn test_dictation_falls_back_to_commands_without_focus() {
    let nav = navigator(FakeBrowser::with_tabs(2, 0));
    enable_dictation(&nav);

    assert_eq!(say(&nav, "next tab"), VoiceOutcome::Executed(Action::SwitchTabRelative(1)));
    assert_eq!(
        nav.host().calls(),
        vec![Call::Page(1, PageOp::InsertText { text: "next tab".to_string() }), Call::Activate(2)]
    );
}

#[test]
fn test_dictation_off_never_inserts() {
    let nav = navigator(FakeBrowser::with_tabs(2, 0));
    nav.host().field_focused.set(true);
    say(&nav, "next tab");
    assert_eq!(nav.host().calls(), vec![Call::Activate(2)]);
}

#[test]
fn test_unreachable_page_is_a_no_op() {
    let nav = navigator(FakeBrowser::with_tabs(2, 0));
    enable_dictation(&nav);
    nav.host().page_unreachable.set(true);

    // Dictation attempt fails quietly and the command still runs.
    assert_eq!(say(&nav, "next tab"), VoiceOutcome::Executed(Action::SwitchTabRelative(1)));
    assert!(matches!(
        say(&nav, "scroll down"),
        VoiceOutcome::Skipped { reason: DispatchError::Host(HostError::PageUnreachable { .. }), .. }
    ));
}

#[test]
fn test_spoken_dictation_toggle() {
    let nav = navigator(FakeBrowser::with_tabs(1, 0));
    assert_eq!(say(&nav, "dictation on"), VoiceOutcome::Executed(Action::SetDictation(true)));
    assert_eq!(nav.host().settings.borrow().dictation, Some(true));
    assert_eq!(nav.host().broadcasts(), vec![Outbound::UiStatus { status: Status::Dictation(true) }]);

    say(&nav, "stop dictation");
    assert_eq!(nav.host().settings.borrow().dictation, Some(false));
}

#[test]
fn test_dictation_capability_disabled() {
    let config = NavigatorConfig { dictation: false, ..NavigatorConfig::default() };
    let nav = Navigator::new(FakeBrowser::with_tabs(2, 0), config);
    enable_dictation(&nav);
    nav.host().field_focused.set(true);

    assert_eq!(say(&nav, "next tab"), VoiceOutcome::Executed(Action::SwitchTabRelative(1)));
    assert!(matches!(say(&nav, "dictation on"), VoiceOutcome::Skipped { .. }));
    assert_eq!(
        nav.host().broadcasts(),
        vec![Outbound::UiStatus { status: Status::Unknown("dictation on".to_string()) }]
    );

    send(&nav, r#"{"type":"toggle-dictation","enabled":false}"#);
    assert_eq!(nav.host().settings.borrow().dictation, Some(true));
    let Some(Reply::Status(snapshot)) = send(&nav, r#"{"type":"request-status"}"#) else {
        panic!("expected a status reply");
    };
    assert!(!snapshot.dictation);
}

#[test]
fn test_voice_command_message() {
    let nav = navigator(FakeBrowser::with_tabs(2, 0));
    assert_eq!(send(&nav, r#"{"type":"voice-command","command":"next tab"}"#), None);
    assert_eq!(nav.host().calls(), vec![Call::Activate(2)]);
}

#[test]
fn test_request_status_defaults() {
    let nav = navigator(FakeBrowser::default());
    assert_eq!(
        send(&nav, r#"{"type":"request-status"}"#),
        Some(Reply::Status(StatusSnapshot {
            enabled: false,
            dictation: false,
            transcript: String::new(),
            status: Status::Stopped,
        }))
    );
}

#[test]
fn test_transcript_and_status_are_stored_and_broadcast() {
    let nav = navigator(FakeBrowser::default());
    send(&nav, r#"{"type":"voice-transcript","transcript":"scroll dow"}"#);
    send(&nav, r#"{"type":"voice-status","status":"error:not-allowed"}"#);
    send(&nav, r#"{"type":"voice-status"}"#);

    let settings = nav.host().settings.borrow().clone();
    assert_eq!(settings.transcript.as_deref(), Some("scroll dow"));
    assert_eq!(settings.status, Some(Status::Stopped));
    assert_eq!(
        nav.host().broadcasts(),
        vec![
            Outbound::UiTranscript { transcript: "scroll dow".to_string() },
            Outbound::UiStatus { status: Status::Error("not-allowed".to_string()) },
            Outbound::UiStatus { status: Status::Stopped },
        ]
    );
}

#[test]
fn test_enabling_twice_opens_one_surface() {
    let nav = navigator(FakeBrowser::default());
    assert_eq!(send(&nav, r#"{"type":"toggle-voice","enabled":true}"#), Some(Reply::Ack { ok: true }));
    send(&nav, r#"{"type":"toggle-voice","enabled":true}"#);

    assert_eq!(nav.host().surface_opens(), 1);
    assert_eq!(nav.host().broadcasts(), vec![Outbound::VoiceStart, Outbound::VoiceStart]);
    let settings = nav.host().settings.borrow().clone();
    assert!(settings.enabled);
    assert_eq!(settings.status, Some(Status::Listening));
}

#[test]
fn test_closed_surface_is_recreated_while_enabled() {
    let nav = navigator(FakeBrowser::default());
    send(&nav, r#"{"type":"toggle-voice","enabled":true}"#);
    let first = nav.session().surface().expect("surface open");

    // The user closes the listener tab.
    nav.host().surfaces.borrow_mut().clear();
    block_on(nav.on_surface_removed(first));

    let second = nav.session().surface().expect("surface reopened");
    assert_ne!(first, second);
    assert_eq!(nav.host().surface_opens(), 2);
}

#[test]
fn test_unrelated_removal_is_ignored() {
    let nav = navigator(FakeBrowser::default());
    send(&nav, r#"{"type":"toggle-voice","enabled":true}"#);
    let own = nav.session().surface().expect("surface open");
    block_on(nav.on_surface_removed(SurfaceHandle { kind: SurfaceKind::Tab, id: own.id + 100 }));
    assert_eq!(nav.session().surface(), Some(own));
    assert_eq!(nav.host().surface_opens(), 1);
}

#[test]
fn test_disabling_closes_surface() {
    let nav = navigator(FakeBrowser::default());
    send(&nav, r#"{"type":"toggle-voice","enabled":true}"#);
    let surface = nav.session().surface().expect("surface open");
    send(&nav, r#"{"type":"toggle-voice","enabled":false}"#);

    assert_eq!(nav.host().calls().last(), Some(&Call::CloseSurface(surface)));
    assert_eq!(nav.host().broadcasts().last(), Some(&Outbound::VoiceStop));
    assert_eq!(nav.session().surface(), None);
    assert_eq!(nav.host().settings.borrow().status, Some(Status::Stopped));

    // Removal after disabling does not bring it back.
    block_on(nav.on_surface_removed(surface));
    assert_eq!(nav.host().surface_opens(), 1);
}

#[test]
fn test_window_surface_strategy() {
    let config = NavigatorConfig { surface: SurfaceKind::Window, ..NavigatorConfig::default() };
    let nav = Navigator::new(FakeBrowser::default(), config);
    send(&nav, r#"{"type":"toggle-voice","enabled":true}"#);
    assert_eq!(nav.session().surface().map(|handle| handle.kind), Some(SurfaceKind::Window));
}

#[test]
fn test_install_seeds_dictation_and_resumes() {
    let nav = navigator(FakeBrowser::default());
    nav.host().settings.borrow_mut().enabled = true;
    block_on(nav.on_installed());
    assert_eq!(nav.host().settings.borrow().dictation, Some(false));
    assert_eq!(nav.host().surface_opens(), 1);
    assert_eq!(nav.host().broadcasts(), vec![Outbound::VoiceStart]);

    // An existing choice survives reinstall.
    nav.host().settings.borrow_mut().dictation = Some(true);
    block_on(nav.on_installed());
    assert_eq!(nav.host().settings.borrow().dictation, Some(true));
}

#[test]
fn test_startup_only_resumes_when_enabled() {
    let nav = navigator(FakeBrowser::default());
    block_on(nav.on_startup());
    assert_eq!(nav.host().surface_opens(), 0);

    nav.host().settings.borrow_mut().enabled = true;
    block_on(nav.on_startup());
    assert_eq!(nav.host().surface_opens(), 1);
}

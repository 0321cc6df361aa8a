//! Tests for the popup viewer proxy
//!
//! The proxy launches the popup window on demand, keeps only the latest
//! command while the window is starting, and replays the loaded help sets
//! plus that command once the viewer connects.

use std::sync::Arc;

use cwf_help_ipc::{Error as IpcError, ViewerCommand};
use cwf_help_types::HelpViewType;

use super::fixtures::{SELECT_URL, fixture_services, help_fixture};
use crate::config::DEFAULT_VIEWER_URL;
use crate::error::Error;
use crate::services::HelpServices;
use crate::viewer::{HelpViewer, HelpViewerApi, HelpViewerProxy, ProxyState, ViewerMode};

fn connect(proxy: &mut HelpViewerProxy, services: &Arc<HelpServices>) -> HelpViewer {
    let viewer = HelpViewer::popup("viewer1", "owner", services);
    proxy.process_inbound();
    viewer
}

#[test]
fn test_show_launches_window_and_buffers() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();

    assert_eq!(proxy.state(), ProxyState::NoRemote);
    assert_eq!(proxy.queue_name(), "helpowner");

    proxy.show_view(HelpViewType::Toc);

    assert_eq!(proxy.state(), ProxyState::Starting);
    assert_eq!(
        proxy.pending(),
        Some(&ViewerCommand::ShowView {
            view_type: HelpViewType::Toc
        })
    );
    assert_eq!(
        launcher.opened(),
        vec![(
            format!("{DEFAULT_VIEWER_URL}?proxy=owner"),
            "helpowner".to_string()
        )]
    );
}

#[test]
fn test_latest_command_wins_while_starting() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();

    proxy.show();
    proxy.show_topic(&fixture.patients, Some("select"), None);
    proxy.merge_help_set(&fixture.orders);

    assert_eq!(
        proxy.pending(),
        Some(&ViewerCommand::MergeHelpSet {
            help_set: fixture.orders.clone()
        })
    );
    assert_eq!(proxy.help_sets(), &[fixture.orders.clone()]);
    assert_eq!(launcher.opened().len(), 2);
}

#[test]
fn test_load_and_merge_do_not_launch() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();

    proxy.load(&[fixture.patients.clone(), fixture.patients.clone()]);
    proxy.merge_help_set(&fixture.orders);
    proxy.merge_help_set(&fixture.orders);

    assert_eq!(proxy.state(), ProxyState::NoRemote);
    assert!(launcher.opened().is_empty());
    assert_eq!(
        proxy.help_sets(),
        &[fixture.patients.clone(), fixture.orders.clone()]
    );
}

#[test]
fn test_connect_replays_help_sets_then_pending() {
    let fixture = help_fixture();
    let (services, _launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();

    proxy.load(&[fixture.patients.clone()]);
    proxy.show_topic(&fixture.patients, Some("select"), None);

    let mut viewer = connect(&mut proxy, &services);
    assert_eq!(proxy.state(), ProxyState::Connected);
    assert!(proxy.pending().is_none());
    assert_eq!(viewer.queue_name(), Some("helpviewer1"));

    viewer.process_inbound();

    assert_eq!(viewer.help_sets().len(), 1);
    assert_eq!(viewer.current_url().as_deref(), Some(SELECT_URL));
    assert_eq!(viewer.selected_view(), Some(HelpViewType::History));
    assert!(viewer.is_visible());
    assert!(!viewer.is_loading());

    proxy.process_inbound();
    viewer.process_inbound();
    assert_eq!(viewer.history().len(), 1);
}

#[test]
fn test_connected_proxy_sends_immediately() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();
    proxy.show();
    let mut viewer = connect(&mut proxy, &services);
    viewer.process_inbound();

    proxy.merge_help_set(&fixture.patients);
    proxy.show_view(HelpViewType::Keyword);

    assert!(proxy.pending().is_none());
    assert_eq!(launcher.opened().len(), 1);

    viewer.process_inbound();
    assert_eq!(viewer.help_sets().len(), 1);
    assert_eq!(viewer.selected_view(), Some(HelpViewType::Keyword));
}

#[test]
fn test_lost_remote_relaunches() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();
    proxy.show();
    let viewer = connect(&mut proxy, &services);
    drop(viewer);

    proxy.show_home("intro", None);

    assert_eq!(proxy.state(), ProxyState::Starting);
    assert_eq!(
        proxy.pending(),
        Some(&ViewerCommand::ShowHome {
            home_id: "intro".to_string(),
            topic_id: None
        })
    );
    assert_eq!(launcher.opened().len(), 2);
}

#[test]
fn test_blocked_launch_keeps_command() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    launcher.set_blocked(true);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();

    proxy.show();

    assert_eq!(proxy.state(), ProxyState::NoRemote);
    assert_eq!(proxy.pending(), Some(&ViewerCommand::Show));

    launcher.set_blocked(false);
    proxy.show();
    assert_eq!(proxy.state(), ProxyState::Starting);
    assert_eq!(launcher.opened().len(), 1);
}

#[test]
fn test_close_before_connect() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();
    proxy.load(&[fixture.patients.clone()]);

    proxy.close();

    assert!(proxy.is_closed());
    assert!(proxy.pending().is_none());
    assert!(services.queues().get("helpowner").is_none());

    proxy.show();
    proxy.close();
    assert_eq!(proxy.state(), ProxyState::Closed);
    assert!(proxy.pending().is_none());
    assert!(launcher.opened().is_empty());
}

#[test]
fn test_close_reaches_connected_viewer() {
    let fixture = help_fixture();
    let (services, _launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();
    proxy.show();
    let mut viewer = connect(&mut proxy, &services);
    viewer.process_inbound();

    proxy.close();
    viewer.process_inbound();

    assert!(viewer.is_closed());
    assert!(!viewer.is_visible());
    assert!(services.queues().is_empty());
}

#[test]
fn test_viewer_closes_when_owner_goes_away() {
    let fixture = help_fixture();
    let (services, _launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();
    proxy.show();
    let mut viewer = connect(&mut proxy, &services);

    drop(proxy);
    viewer.process_inbound();

    assert!(viewer.is_closed());
}

#[test]
fn test_viewer_close_notifies_proxy_on_next_send() {
    let fixture = help_fixture();
    let (services, launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let mut proxy = HelpViewerProxy::new("owner", &services).unwrap();
    proxy.show();
    let mut viewer = connect(&mut proxy, &services);

    viewer.close();
    assert!(viewer.is_closed());

    proxy.show();
    assert_eq!(proxy.state(), ProxyState::Starting);
    assert_eq!(proxy.pending(), Some(&ViewerCommand::Show));
    assert_eq!(launcher.opened().len(), 2);
}

#[test]
fn test_one_proxy_per_page() {
    let fixture = help_fixture();
    let (services, _launcher) = fixture_services(&fixture, ViewerMode::Popup);
    let _proxy = HelpViewerProxy::new("owner", &services).unwrap();

    assert!(matches!(
        HelpViewerProxy::new("owner", &services),
        Err(Error::Ipc(IpcError::QueueExists(name))) if name == "helpowner"
    ));
}

//! Behaviour of the interactive client loop.
//!
//! Each test drives [`Client::run`] with a scripted key source and a ratatui
//! `TestBackend`, then checks what reached the node and what is on screen.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use comm::{ChatObserver, Chat, Client, ClientError, ClientHandle, KeyInput, KeySource, Node, Peer};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

/// Replays a fixed list of reads. `None` entries are poll timeouts. Once the
/// script runs out the source either stops the client or idles forever.
struct ScriptedKeys {
    script: VecDeque<io::Result<Option<KeyInput>>>,
    on_exhausted: Option<ClientHandle>,
}

impl ScriptedKeys {
    fn new(keys: impl IntoIterator<Item = Option<KeyInput>>, client: &Client) -> Self {
        Self {
            script: keys.into_iter().map(Ok).collect(),
            on_exhausted: Some(client.handle()),
        }
    }

    fn idle() -> Self {
        Self { script: VecDeque::new(), on_exhausted: None }
    }

    fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        match self.script.pop_front() {
            Some(read) => read,
            None => {
                match &self.on_exhausted {
                    Some(handle) => handle.stop(),
                    None => thread::sleep(timeout.min(Duration::from_millis(5))),
                }
                Ok(None)
            }
        }
    }
}

/// Records every chat handed to it; optionally stops the client on delivery.
#[derive(Default)]
struct RecordingNode {
    sent: Mutex<Vec<(String, Option<Peer>)>>,
    stop_on_send: Option<ClientHandle>,
}

impl RecordingNode {
    fn sent(&self) -> Vec<(String, Option<Peer>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Node for RecordingNode {
    fn deliver_chat(&self, text: String, to: Option<Peer>) {
        self.sent.lock().unwrap().push((text, to));
        if let Some(handle) = &self.stop_on_send {
            handle.stop();
        }
    }
}

fn terminal() -> Terminal<TestBackend> {
    Terminal::new(TestBackend::new(100, 16)).unwrap()
}

fn screen(terminal: &Terminal<TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.height)
        .map(|y| (0..buffer.area.width).map(|x| buffer[(x, y)].symbol().to_string()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn chars(text: &str) -> Vec<Option<KeyInput>> {
    text.chars().map(|c| Some(KeyInput::Char(c))).collect()
}

fn peer(address: &str) -> Peer {
    Peer::new(address, "127.0.0.1", 6667)
}

#[test]
fn backspace_edits_pending_line() {
    let mut client = Client::new();
    let node = RecordingNode::default();
    let mut keys = ScriptedKeys::new(
        [Some(KeyInput::Char('h')), Some(KeyInput::Char('i')), Some(KeyInput::Backspace), Some(KeyInput::Char('o'))],
        &client,
    );
    let mut terminal = terminal();

    client.run(&node, &mut keys, &mut terminal).unwrap();

    assert_eq!(client.input(), "ho");
    assert!(node.sent().is_empty());
    assert!(screen(&terminal).contains("ho"));
}

#[test]
fn enter_submits_to_selected_peer_and_clears_input() {
    let mut client = Client::new();
    let handle = client.handle();
    handle.add_peer(peer("p1"));
    handle.add_peer(peer("p2"));
    let node = RecordingNode::default();

    let mut script = vec![Some(KeyInput::Down)];
    script.extend(chars("hello"));
    script.push(Some(KeyInput::Enter));
    let mut keys = ScriptedKeys::new(script, &client);
    let mut terminal = terminal();

    client.run(&node, &mut keys, &mut terminal).unwrap();

    assert_eq!(node.sent(), vec![("hello".to_string(), Some(peer("p2")))]);
    assert_eq!(client.input(), "");
    assert!(!screen(&terminal).contains("hello"));
}

#[test]
fn empty_enter_without_peers_still_sends() {
    let mut client = Client::new();
    let node = RecordingNode::default();
    let mut keys = ScriptedKeys::new([Some(KeyInput::Enter), Some(KeyInput::Enter)], &client);

    client.run(&node, &mut keys, &mut terminal()).unwrap();

    assert_eq!(node.sent(), vec![(String::new(), None), (String::new(), None)]);
}

#[test]
fn stop_before_run_consumes_no_keys() {
    let mut client = Client::new();
    client.handle().stop();
    let mut keys = ScriptedKeys::new(chars("abc"), &client);

    client.run(&RecordingNode::default(), &mut keys, &mut terminal()).unwrap();

    assert_eq!(keys.remaining(), 3);
    assert_eq!(client.input(), "");
}

#[test]
fn stop_during_a_key_lets_that_key_finish() {
    let mut client = Client::new();
    let node = RecordingNode { stop_on_send: Some(client.handle()), ..Default::default() };
    let mut script = chars("hi");
    script.push(Some(KeyInput::Enter));
    script.extend(chars("xy"));
    let mut keys = ScriptedKeys::new(script, &client);

    client.run(&node, &mut keys, &mut terminal()).unwrap();

    assert_eq!(node.sent(), vec![("hi".to_string(), None)]);
    assert_eq!(client.input(), "");
    assert_eq!(keys.remaining(), 2);
}

#[test]
fn stop_from_another_thread_ends_an_idle_loop() {
    let mut client = Client::new();
    let handle = client.handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.stop();
    });

    client.run(&RecordingNode::default(), &mut ScriptedKeys::idle(), &mut terminal()).unwrap();
    stopper.join().unwrap();
}

#[test]
fn quit_key_ends_the_loop() {
    let mut client = Client::new();
    let mut keys = ScriptedKeys::new([Some(KeyInput::Quit), Some(KeyInput::Char('z'))], &client);

    client.run(&RecordingNode::default(), &mut keys, &mut terminal()).unwrap();

    assert_eq!(keys.remaining(), 1);
}

#[test]
fn key_read_failure_is_fatal() {
    let mut client = Client::new();
    let mut keys = ScriptedKeys::new(chars("a"), &client);
    keys.script.push_back(Err(io::Error::new(io::ErrorKind::BrokenPipe, "tty gone")));
    keys.script.extend(chars("b").into_iter().map(Ok));

    let result = client.run(&RecordingNode::default(), &mut keys, &mut terminal());

    assert!(matches!(result, Err(ClientError::Io(_))));
    assert_eq!(client.input(), "a");
}

#[test]
fn inbound_events_show_up_on_screen() {
    let mut client = Client::new();
    let handle = client.handle();
    let mut keys = ScriptedKeys::new([None], &client);
    let mut terminal = terminal();

    let feeder = {
        let handle = handle.clone();
        thread::spawn(move || {
            handle.add_peer(Peer::new("p1", "10.0.0.7", 7000));
            handle.add_message(Chat::new("p1", "me", "hello from p1"));
        })
    };
    feeder.join().unwrap();

    client.run(&RecordingNode::default(), &mut keys, &mut terminal).unwrap();

    let text = screen(&terminal);
    assert!(text.contains("<p1> hello from p1"));
    assert!(text.contains("> p1 10.0.0.7:7000"));
}

#[test]
fn departed_peer_is_replaced_as_target() {
    let mut client = Client::new();
    let handle = client.handle();
    for address in ["p1", "p2", "p3"] {
        handle.add_peer(peer(address));
    }
    let node = RecordingNode::default();

    // select p2, it leaves, then send
    client.handle_key(KeyInput::Down, &node);
    handle.remove_peer(&peer("p2"));
    client.handle_key(KeyInput::Char('k'), &node);
    client.handle_key(KeyInput::Enter, &node);

    assert_eq!(node.sent(), vec![("k".to_string(), Some(peer("p3")))]);
}

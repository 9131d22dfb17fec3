use std::thread;
use tiles_core::input::events::{key_to_lane, InputEvent, InputKind};
use tiles_core::input::InputQueue;

#[test]
fn test_input_queue_transmission() {
    let queue = InputQueue::new();
    let sender = queue.sender();

    // Spawn a producer thread
    let handle = thread::spawn(move || {
        sender.send(InputEvent::press(1, 1_000.0)).unwrap();
        sender.send(InputEvent::release(1, 1_500.0)).unwrap();
    });

    handle.join().unwrap();

    // Consumer (main test thread)
    let received1 = queue.pop().expect("Should receive first event");
    assert_eq!(received1.timestamp, 1_000.0);
    assert_eq!(received1.lane, 1);
    assert_eq!(received1.kind, InputKind::Press);

    let received2 = queue.pop().expect("Should receive second event");
    assert_eq!(received2.timestamp, 1_500.0);
    assert_eq!(received2.kind, InputKind::Release);

    // Queue should be empty now
    assert!(queue.pop().is_none());
}

#[test]
fn test_drain_keeps_arrival_order() {
    let queue = InputQueue::new();
    for lane in [3, 0, 2] {
        queue.push(InputEvent::press(lane, 10.0));
    }
    let lanes: Vec<u8> = queue.drain().iter().map(|e| e.lane).collect();
    assert_eq!(lanes, vec![3, 0, 2]);
    assert!(queue.drain().is_empty());
}

#[test]
fn test_keyboard_layout() {
    assert_eq!(key_to_lane('a'), Some(0));
    assert_eq!(key_to_lane('S'), Some(1));
    assert_eq!(key_to_lane('d'), Some(2));
    assert_eq!(key_to_lane('f'), Some(3));
    assert_eq!(key_to_lane('j'), None);
}

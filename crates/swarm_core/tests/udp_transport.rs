//! Announcements over a real loopback UDP socket pair.

use std::sync::Arc;
use std::time::Duration;
use swarm_core::{
    AllocationEngine, Announcement, Destinations, NotificationChannel, Robot, StateStore,
    SwarmController, SwarmMetrics, Transport, UdpTransport,
};

fn listener() -> UdpTransport {
    let socket = UdpTransport::bind("127.0.0.1:0").expect("bind listener");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .expect("set read timeout");
    socket
}

#[test]
fn assigned_robot_and_observer_receive_the_pair() {
    let robot0 = listener();
    let robot1 = listener();
    let observer = listener();
    let sender = Arc::new(UdpTransport::bind("127.0.0.1:0").expect("bind sender"));
    let sender_addr = sender.local_addr().unwrap();

    let metrics = Arc::new(SwarmMetrics::new());
    let channel = NotificationChannel::new(
        sender,
        Destinations::new(
            vec![robot0.local_addr().unwrap(), robot1.local_addr().unwrap()],
            vec![observer.local_addr().unwrap()],
        ),
        metrics.clone(),
    );
    let swarm = SwarmController::new(
        Arc::new(StateStore::with_robots(vec![
            Robot::new(0, 0.0, 0.0, 100.0),
            Robot::new(1, 10.0, 0.0, 100.0),
        ])),
        AllocationEngine::new(),
        channel,
        metrics.clone(),
    );

    swarm.add_task(swarm_core::Task::new(1, "Inspect area A", 1, 9.0, 0.0));

    let expected = Announcement {
        task_id: 1,
        robot_id: 1,
    };
    let (text, from) = robot1.recv_message().expect("robot 1 datagram");
    assert_eq!(text.parse::<Announcement>(), Ok(expected));
    assert_eq!(from, sender_addr);
    let (text, _) = observer.recv_message().expect("observer datagram");
    assert_eq!(text, "TASK 1 ROBOT 1");
    assert_eq!(metrics.announcements_sent_total.get(), 2);

    robot0
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    assert!(robot0.recv_message().is_err(), "robot 0 was not assigned");
}

#[test]
fn raw_recv_reports_length_and_sender() {
    let a = UdpTransport::bind("127.0.0.1:0").unwrap();
    let b = listener();

    let sent = a.send_to(b"RECALL", b.local_addr().unwrap()).unwrap();
    let mut buf = [0u8; 64];
    let (len, from) = b.recv_from(&mut buf).unwrap();

    assert_eq!(sent, 6);
    assert_eq!(&buf[..len], b"RECALL");
    assert_eq!(from, a.local_addr().unwrap());
}

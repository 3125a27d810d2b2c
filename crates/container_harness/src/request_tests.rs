//! Tests for container requests and options.

use super::*;
use crate::errors::ContainerError;

#[test]
fn test_new_request_holds_only_image() {
    let request = ContainerRequest::new("redis:7");

    assert_eq!(request.image, "redis:7");
    assert!(request.exposed_ports.is_empty());
    assert!(request.env.is_empty());
    assert!(request.cmd.is_empty());
    assert_eq!(request.network, None);
    assert_eq!(request.name, None);
    assert_eq!(request.wait_for, None);
    assert_eq!(request.startup_timeout, None);
}

#[test]
fn test_apply_no_options_is_identity() {
    let request = ContainerRequest::new("redis:7").apply(Vec::new());
    assert_eq!(request, ContainerRequest::new("redis:7"));
}

#[test]
fn test_with_ports_sets_list() {
    let request = ContainerRequest::new("redis:7").apply([with_ports(["6379/tcp"])]);
    assert_eq!(request.exposed_ports, vec!["6379/tcp".to_string()]);
}

#[test]
fn test_with_ports_last_applied_wins() {
    let request = ContainerRequest::new("postgres:16").apply([
        with_ports(["5432/tcp", "9187/tcp"]),
        with_env("POSTGRES_PASSWORD", "secret"),
        with_ports(["5432/tcp"]),
    ]);

    // Replaced, not merged.
    assert_eq!(request.exposed_ports, vec!["5432/tcp".to_string()]);
}

#[test]
fn test_with_ports_empty_clears_earlier_list() {
    let request = ContainerRequest::new("redis:7")
        .apply([with_ports(["6379/tcp"]), with_ports(Vec::<String>::new())]);
    assert!(request.exposed_ports.is_empty());
}

#[test]
fn test_last_port_option_wins_for_every_sequence() {
    let lists: Vec<Vec<&str>> = vec![
        vec!["1/tcp"],
        vec!["2/udp", "3/tcp"],
        vec![],
        vec!["4/tcp"],
    ];

    for n in 1..=lists.len() {
        let options: Vec<ContainerOption> =
            lists[..n].iter().map(|l| with_ports(l.clone())).collect();
        let request = ContainerRequest::new("busybox").apply(options);

        let expected: Vec<String> = lists[n - 1].iter().map(|s| s.to_string()).collect();
        assert_eq!(request.exposed_ports, expected, "after {n} options");
    }
}

#[test]
fn test_with_env_overwrites_same_key_only() {
    let request = ContainerRequest::new("redis:7").apply([
        with_env("A", "1"),
        with_env("B", "2"),
        with_env("A", "3"),
    ]);

    assert_eq!(
        request.env,
        vec![
            ("A".to_string(), "3".to_string()),
            ("B".to_string(), "2".to_string()),
        ]
    );
}

#[test]
fn test_scalar_options_last_write_wins() {
    let request = ContainerRequest::new("redis:7").apply([
        with_name("first"),
        with_network("net-a"),
        with_cmd(["redis-server"]),
        with_wait_for(WaitStrategy::Healthcheck),
        with_startup_timeout(Duration::from_secs(5)),
        with_name("second"),
        with_network("net-b"),
        with_cmd(["redis-server", "--port", "7000"]),
        with_wait_for(WaitStrategy::StdoutMessage("Ready".to_string())),
        with_startup_timeout(Duration::from_secs(30)),
    ]);

    assert_eq!(request.name.as_deref(), Some("second"));
    assert_eq!(request.network.as_deref(), Some("net-b"));
    assert_eq!(request.cmd, vec!["redis-server", "--port", "7000"]);
    assert_eq!(
        request.wait_for,
        Some(WaitStrategy::StdoutMessage("Ready".to_string()))
    );
    assert_eq!(request.startup_timeout, Some(Duration::from_secs(30)));
}

#[test]
fn test_custom_option_can_override_image() {
    let request = ContainerRequest::new("redis:7").apply([ContainerOption::new(|r| {
        r.image = "redis:7-alpine".to_string();
    })]);
    assert_eq!(request.image, "redis:7-alpine");
}

#[test]
fn test_parsed_ports() {
    let request =
        ContainerRequest::new("coredns").apply([with_ports(["53/udp", "9153/tcp", "8080"])]);

    let ports = request.parsed_ports().expect("valid ports");
    assert_eq!(
        ports,
        vec![
            ExposedPort::udp(53),
            ExposedPort::tcp(9153),
            ExposedPort::tcp(8080),
        ]
    );
}

#[test]
fn test_parsed_ports_reports_first_invalid() {
    let request = ContainerRequest::new("redis:7").apply([with_ports(["6379/tcp", "nope"])]);

    let err = request.parsed_ports().unwrap_err();
    match err {
        ContainerError::InvalidPort { spec, .. } => assert_eq!(spec, "nope"),
        other => panic!("Expected InvalidPort, got {other:?}"),
    }
}

#[test]
fn test_image_reference() {
    let request = ContainerRequest::new("redis:7");
    let image = request.image_reference().expect("valid image");
    assert_eq!(image.repository(), "redis");
    assert_eq!(image.tag(), "7");
}

#[test]
fn test_option_debug_is_opaque() {
    assert_eq!(format!("{:?}", with_name("x")), "ContainerOption(..)");
}

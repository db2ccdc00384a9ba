//! End-to-end tests for command dispatch over mock back-ends

use patchbay::{Command, CommandError};
use patchbay_e2e::harness::{US_IAD_IPV4, US_IAD_IPV6};
use patchbay_e2e::{Harness, HostOp};

fn create_proxy(owner: &str, location: &str, hostname: &str, ip_port: &str) -> Command {
    Command::CreateProxy {
        owner: owner.to_string(),
        location: location.to_string(),
        hostname: hostname.to_string(),
        ip_port: ip_port.to_string(),
    }
}

fn create_dns(owner: &str, hostname: &str, ip: &str) -> Command {
    Command::CreateDns {
        owner: owner.to_string(),
        hostname: hostname.to_string(),
        ip: ip.to_string(),
    }
}

fn delete_proxy(owner: &str, location: &str, hostname: &str) -> Command {
    Command::DeleteProxy {
        owner: owner.to_string(),
        location: location.to_string(),
        hostname: hostname.to_string(),
    }
}

fn delete_dns(owner: &str, hostname: &str) -> Command {
    Command::DeleteDns {
        owner: owner.to_string(),
        hostname: hostname.to_string(),
    }
}

#[tokio::test]
async fn locations_lists_catalog_in_stable_order() {
    let h = Harness::new();

    let reply = h.orchestrator.dispatch(Command::Locations).await.unwrap();
    assert_eq!(reply.summary, "Proxy Locations");
    assert_eq!(reply.fields.len(), 2);
    // BTreeMap order
    assert_eq!(reply.fields[0].name, "eu-fra");
    assert_eq!(reply.fields[0].value, "Frankfurt, Germany");
    assert_eq!(reply.fields[1].name, "us-iad");
}

#[tokio::test]
async fn create_proxy_provisions_records_config_and_row() {
    let h = Harness::new();

    let reply = h
        .orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:80"))
        .await
        .unwrap();
    assert_eq!(
        reply.summary,
        "Proxy for https://myservice.apps.example.com pointing to `100.64.0.1:80` has been created."
    );

    // Exactly one A and one AAAA record for the new name
    let fqdn = Harness::fqdn("myservice");
    let records = h.dns.records_named(&fqdn);
    assert_eq!(records.len(), 2);
    let a = records.iter().find(|r| r.record_type == "A").unwrap();
    assert_eq!(a.content, US_IAD_IPV4);
    let aaaa = records.iter().find(|r| r.record_type == "AAAA").unwrap();
    assert_eq!(aaaa.content, US_IAD_IPV6);

    // The proxy host got the site file appended, then a restart
    let file = format!("{}.caddy", fqdn);
    assert_eq!(
        h.remote.ops(),
        vec![
            HostOp::Append {
                host: US_IAD_IPV4.to_string(),
                file: file.clone(),
            },
            HostOp::Restart {
                host: US_IAD_IPV4.to_string(),
            },
        ]
    );
    let config = h.remote.config_for(US_IAD_IPV4, &file).unwrap();
    assert!(config.contains("reverse_proxy 100.64.0.1:80"));

    // Exactly one new row with those four fields
    let rows = h.store.all_proxies().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].owner, "alice");
    assert_eq!(rows[0].location, "us-iad");
    assert_eq!(rows[0].hostname, "myservice");
    assert_eq!(rows[0].ip_port, "100.64.0.1:80");
}

#[tokio::test]
async fn create_proxy_unknown_location_enumerates_keys() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .dispatch(create_proxy("alice", "ap-syd", "myservice", "100.64.0.1:80"))
        .await
        .unwrap_err();
    assert!(err.is_rejection());
    let message = err.to_string();
    assert!(message.contains("Invalid proxy location"));
    assert!(message.contains("us-iad - Ashburn, Virginia"));
    assert!(message.contains("eu-fra - Frankfurt, Germany"));

    // Rejected before any external call
    assert_eq!(h.dns.call_count(), 0);
    assert_eq!(h.remote.call_count(), 0);
    assert!(h.store.all_proxies().unwrap().is_empty());
}

#[tokio::test]
async fn create_proxy_rejects_bad_hostname() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .dispatch(create_proxy("alice", "us-iad", "my service", "100.64.0.1:80"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Invalid(_)));
    assert_eq!(h.dns.call_count(), 0);
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn create_proxy_rejects_out_of_range_port() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:70000"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Invalid(_)));
    assert!(err.to_string().contains("between `1` and `65535`"));
    assert_eq!(h.dns.call_count(), 0);
}

#[tokio::test]
async fn create_dns_provisions_one_a_record_and_row() {
    let h = Harness::new();

    let reply = h
        .orchestrator
        .dispatch(create_dns("alice", "myservice", "100.64.0.1"))
        .await
        .unwrap();
    assert_eq!(
        reply.summary,
        "DNS record for `myservice.apps.example.com` pointing to `100.64.0.1` has been created."
    );

    let records = h.dns.records_named(&Harness::fqdn("myservice"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_type, "A");
    assert_eq!(records[0].content, "100.64.0.1");

    // No proxy host involvement for bare DNS records
    assert_eq!(h.remote.call_count(), 0);

    let row = h.store.find_dns("alice", "myservice").unwrap().unwrap();
    assert_eq!(row.ip, "100.64.0.1");
}

#[tokio::test]
async fn create_dns_rejects_bad_ipv4() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .dispatch(create_dns("alice", "myservice", "100.64.0.256"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Invalid(_)));
    assert_eq!(h.dns.call_count(), 0);
    assert!(h.store.all_dns().unwrap().is_empty());
}

#[tokio::test]
async fn delete_proxy_without_row_makes_no_external_calls() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .dispatch(delete_proxy("alice", "us-iad", "ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
    assert_eq!(err.to_string(), "No such proxy found for deletion.");
    assert_eq!(h.dns.call_count(), 0);
    assert_eq!(h.remote.call_count(), 0);
}

#[tokio::test]
async fn delete_proxy_removes_records_config_and_row() {
    let h = Harness::new();

    h.orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:80"))
        .await
        .unwrap();

    // A record type this tool never manages survives the delete
    let fqdn = Harness::fqdn("myservice");
    h.dns.seed_record(&fqdn, "TXT", "v=spf1 -all");

    let reply = h
        .orchestrator
        .dispatch(delete_proxy("alice", "us-iad", "myservice"))
        .await
        .unwrap();
    assert_eq!(
        reply.summary,
        "Proxy for `myservice.apps.example.com` pointing to `100.64.0.1:80` has been deleted."
    );

    let remaining = h.dns.records_named(&fqdn);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].record_type, "TXT");

    assert!(h.store.find_proxy("alice", "us-iad", "myservice").unwrap().is_none());

    let file = format!("{}.caddy", fqdn);
    let host = US_IAD_IPV4.to_string();
    assert_eq!(
        h.remote.ops(),
        vec![
            HostOp::Append {
                host: host.clone(),
                file: file.clone(),
            },
            HostOp::Restart { host: host.clone() },
            HostOp::Remove {
                host: host.clone(),
                file: file.clone(),
            },
            HostOp::Restart { host },
        ]
    );
    assert!(h.remote.config_for(US_IAD_IPV4, &file).is_none());
}

#[tokio::test]
async fn delete_proxy_requires_matching_owner() {
    let h = Harness::new();

    h.orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:80"))
        .await
        .unwrap();
    let calls_after_create = h.dns.call_count();

    let err = h
        .orchestrator
        .dispatch(delete_proxy("bob", "us-iad", "myservice"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
    assert_eq!(h.dns.call_count(), calls_after_create);
    assert!(h.store.find_proxy("alice", "us-iad", "myservice").unwrap().is_some());
}

#[tokio::test]
async fn delete_dns_removes_only_exact_name_and_type() {
    let h = Harness::new();

    h.orchestrator
        .dispatch(create_dns("alice", "myservice", "100.64.0.1"))
        .await
        .unwrap();

    // Same name, different type; different name, same type
    let fqdn = Harness::fqdn("myservice");
    h.dns.seed_record(&fqdn, "AAAA", "2001:db8::1");
    h.dns.seed_record("other.apps", "A", "100.64.0.2");

    h.orchestrator
        .dispatch(delete_dns("alice", "myservice"))
        .await
        .unwrap();

    let remaining = h.dns.records_named(&fqdn);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].record_type, "AAAA");

    let other = h.dns.records_named(&Harness::fqdn("other"));
    assert_eq!(other.len(), 1);

    assert!(h.store.find_dns("alice", "myservice").unwrap().is_none());
}

#[tokio::test]
async fn delete_dns_without_row_makes_no_external_calls() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .dispatch(delete_dns("alice", "ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::NotFound(_)));
    assert_eq!(err.to_string(), "No such DNS record found for deletion.");
    assert_eq!(h.dns.call_count(), 0);
}

#[tokio::test]
async fn delete_dns_rejects_bad_hostname() {
    let h = Harness::new();

    let err = h
        .orchestrator
        .dispatch(delete_dns("alice", "my.service"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Invalid(_)));
    assert_eq!(h.dns.call_count(), 0);
}

#[tokio::test]
async fn list_own_distinguishes_empty_from_populated() {
    let h = Harness::new();

    let empty = h
        .orchestrator
        .dispatch(Command::ListOwn {
            owner: "alice".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(empty.summary, "You have no proxies or DNS records.");
    assert!(empty.fields.is_empty());

    h.orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:80"))
        .await
        .unwrap();
    h.orchestrator
        .dispatch(create_dns("alice", "standalone", "100.64.0.9"))
        .await
        .unwrap();

    let populated = h
        .orchestrator
        .dispatch(Command::ListOwn {
            owner: "alice".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(populated.summary, "Active Proxies and DNS Records");
    assert_eq!(populated.fields.len(), 2);
    assert_eq!(
        populated.fields[0].name,
        "Proxy: myservice.apps.example.com (us-iad)"
    );
    assert_eq!(
        populated.fields[1].name,
        "DNS Record: standalone.apps.example.com"
    );

    // Another user still sees the empty reply
    let other = h
        .orchestrator
        .dispatch(Command::ListOwn {
            owner: "bob".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(other.summary, "You have no proxies or DNS records.");
}

#[tokio::test]
async fn list_all_includes_every_owner() {
    let h = Harness::new();

    let empty = h.orchestrator.dispatch(Command::ListAll).await.unwrap();
    assert_eq!(empty.summary, "No proxies or DNS records found.");

    h.orchestrator
        .dispatch(create_proxy("alice", "us-iad", "a-service", "100.64.0.1:80"))
        .await
        .unwrap();
    h.orchestrator
        .dispatch(create_dns("bob", "b-service", "100.64.0.2"))
        .await
        .unwrap();

    let all = h.orchestrator.dispatch(Command::ListAll).await.unwrap();
    assert_eq!(all.summary, "All Active Proxies and DNS Records");
    assert_eq!(all.fields.len(), 2);
    assert!(all.fields[0].name.starts_with("User alice - Proxy:"));
    assert!(all.fields[1].name.starts_with("User bob - DNS Record:"));
}

#[tokio::test]
async fn remote_failure_leaves_dns_records_and_skips_store_write() {
    let h = Harness::new();
    h.remote.set_fail_append(true);

    let err = h
        .orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:80"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Remote(_)));

    // No rollback: the A and AAAA records created before the failure
    // stay live, but the store never hears about the proxy
    assert_eq!(h.dns.records_named(&Harness::fqdn("myservice")).len(), 2);
    assert!(h.store.all_proxies().unwrap().is_empty());

    // The restart step was never reached
    assert!(h.remote.ops().is_empty());
}

#[tokio::test]
async fn dns_failure_aborts_before_remote_calls() {
    let h = Harness::new();
    h.dns.set_fail_create(true);

    let err = h
        .orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:80"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Dns(_)));
    assert_eq!(h.remote.call_count(), 0);
    assert!(h.store.all_proxies().unwrap().is_empty());
}

#[tokio::test]
async fn restart_failure_still_surfaces_after_config_write() {
    let h = Harness::new();
    h.remote.set_fail_restart(true);

    let err = h
        .orchestrator
        .dispatch(create_proxy("alice", "us-iad", "myservice", "100.64.0.1:80"))
        .await
        .unwrap_err();
    assert!(matches!(err, CommandError::Remote(_)));

    // Config was appended but the row was never written
    let file = format!("{}.caddy", Harness::fqdn("myservice"));
    assert!(h.remote.config_for(US_IAD_IPV4, &file).is_some());
    assert!(h.store.all_proxies().unwrap().is_empty());
}

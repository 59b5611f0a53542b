//! End-to-end dispatcher behaviour with fake extractors

use jobscrape::dispatcher::DispatchOptions;
use jobscrape::error::ExtractionError;
use jobscrape::registry::Strategy;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod common;
use common::{
    Behavior, FakeHeavy, FakeLight, bare_site, dispatcher, fast_options, records, site,
};

#[tokio::test]
async fn test_mixed_registry_escalates_only_empty_light_sites() {
    let light = Arc::new(
        FakeLight::new()
            .on("Acme", Behavior::Records(records("Acme", 2)))
            .on("Bolt", Behavior::Empty),
    );
    let heavy = FakeHeavy::new()
        .on("Bolt", Behavior::Records(records("Bolt", 3)))
        .on("Cirrus", Behavior::Records(records("Cirrus", 1)));
    let probe = Arc::clone(&heavy.probe);

    let sites = vec![
        site("Acme", Strategy::LightStandard),
        site("Bolt", Strategy::LightCustom),
        site("Cirrus", Strategy::Heavy),
    ];
    let result = dispatcher(light, heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    let firms: Vec<_> = result.records.iter().map(|r| r.firm.as_str()).collect();
    assert_eq!(firms, ["Acme", "Acme", "Bolt", "Bolt", "Bolt", "Cirrus"]);
    assert!(result.failures.is_empty());
    assert!(!result.interrupted);

    // Acme succeeded on the light tier and never reached the browser
    assert_eq!(probe.seen(), ["Bolt", "Cirrus"]);
    assert_eq!(probe.launches(), 1);
    assert_eq!(probe.closes(), 1);
}

#[tokio::test]
async fn test_heavy_result_replaces_failed_light_attempt() {
    let light = Arc::new(FakeLight::new().on(
        "Bolt",
        Behavior::Fail(ExtractionError::Network("403 Forbidden".into())),
    ));
    let heavy = FakeHeavy::new().on("Bolt", Behavior::Empty);

    let result = dispatcher(light, heavy, fast_options())
        .run(vec![site("Bolt", Strategy::LightCustom)], &CancellationToken::new())
        .await;

    // The browser came back empty: no records, and the earlier error is superseded
    assert!(result.records.is_empty());
    assert!(result.failures.is_empty());
}

#[tokio::test]
async fn test_heavy_failure_is_terminal_and_logged() {
    let light = Arc::new(FakeLight::new());
    let heavy = FakeHeavy::new().on(
        "Bolt",
        Behavior::Fail(ExtractionError::Parse("no cards".into())),
    );

    let result = dispatcher(light, heavy, fast_options())
        .run(vec![site("Bolt", Strategy::LightCustom)], &CancellationToken::new())
        .await;

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].site, "Bolt");
    assert_eq!(result.failures[0].error, ExtractionError::Parse("no cards".into()));
}

#[tokio::test]
async fn test_runtime_launch_failure_fails_escalation_set_only() {
    let light = Arc::new(
        FakeLight::new()
            .on("Acme", Behavior::Records(records("Acme", 2)))
            .on("Bolt", Behavior::Empty),
    );
    let cause = ExtractionError::RuntimeUnavailable("chromium not found".into());
    let heavy = FakeHeavy::new().failing_launch(cause.clone());
    let probe = Arc::clone(&heavy.probe);

    let sites = vec![
        site("Acme", Strategy::LightStandard),
        site("Bolt", Strategy::LightCustom),
        site("Cirrus", Strategy::Heavy),
    ];
    let result = dispatcher(light, heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    assert_eq!(result.records.len(), 2);
    assert!(result.records.iter().all(|r| r.firm == "Acme"));

    let failed: Vec<_> = result.failures.iter().map(|f| f.site.as_str()).collect();
    assert_eq!(failed, ["Bolt", "Cirrus"]);
    assert!(result.failures.iter().all(|f| f.error == cause));

    assert_eq!(probe.launches(), 1);
    assert_eq!(probe.closes(), 0);
    assert!(probe.seen().is_empty());
}

#[tokio::test]
async fn test_non_runtime_launch_error_is_reported_as_runtime_unavailable() {
    let heavy = FakeHeavy::new().failing_launch(ExtractionError::Network("ws closed".into()));

    let result = dispatcher(Arc::new(FakeLight::new()), heavy, fast_options())
        .run(vec![site("Cirrus", Strategy::Heavy)], &CancellationToken::new())
        .await;

    assert!(matches!(
        result.failures[0].error,
        ExtractionError::RuntimeUnavailable(_)
    ));
}

#[tokio::test]
async fn test_empty_registry_never_launches_runtime() {
    let heavy = FakeHeavy::new();
    let probe = Arc::clone(&heavy.probe);

    let result = dispatcher(Arc::new(FakeLight::new()), heavy, fast_options())
        .run(Vec::new(), &CancellationToken::new())
        .await;

    assert!(result.is_empty());
    assert!(!result.interrupted);
    assert_eq!(probe.launches(), 0);
}

#[tokio::test]
async fn test_all_light_success_skips_browser_phase() {
    let light = Arc::new(
        FakeLight::new()
            .on("Acme", Behavior::Records(records("Acme", 1)))
            .on("Bolt", Behavior::Records(records("Bolt", 1))),
    );
    let heavy = FakeHeavy::new();
    let probe = Arc::clone(&heavy.probe);

    let sites = vec![
        site("Acme", Strategy::LightStandard),
        site("Bolt", Strategy::LightCustom),
    ];
    let result = dispatcher(light, heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    assert_eq!(result.records.len(), 2);
    assert_eq!(probe.launches(), 0);
    assert_eq!(probe.closes(), 0);
}

#[tokio::test]
async fn test_heavy_site_is_never_sent_to_light_tier() {
    let light = Arc::new(FakeLight::new());
    let heavy = FakeHeavy::new().on("Cirrus", Behavior::Empty);
    let probe = Arc::clone(&heavy.probe);

    let result = dispatcher(Arc::clone(&light), heavy, fast_options())
        .run(vec![site("Cirrus", Strategy::Heavy)], &CancellationToken::new())
        .await;

    assert!(result.is_empty());
    assert_eq!(light.gauge.calls(), 0);
    // Exactly one browser attempt: heavy sites are not escalated again
    assert_eq!(probe.gauge.calls(), 1);
}

#[tokio::test]
async fn test_always_failing_extractors_never_abort_the_run() {
    let names = ["Acme", "Bolt", "Cirrus", "Delta", "Echo"];
    let mut light = FakeLight::new();
    let mut heavy = FakeHeavy::new();
    for name in names {
        light = light.on(name, Behavior::Fail(ExtractionError::Network("reset".into())));
        heavy = heavy.on(name, Behavior::Fail(ExtractionError::Network("reset".into())));
    }

    let sites = names.iter().map(|n| site(n, Strategy::LightCustom)).collect();
    let result = dispatcher(Arc::new(light), heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    assert!(result.records.is_empty());
    let failed: Vec<_> = result.failures.iter().map(|f| f.site.as_str()).collect();
    assert_eq!(failed, names);
}

#[tokio::test]
async fn test_timeouts_become_failures() {
    let light = Arc::new(FakeLight::new().on(
        "Slowpoke",
        Behavior::Delay(Duration::from_millis(500), records("Slowpoke", 1)),
    ));
    let heavy = FakeHeavy::new().on(
        "Slowpoke",
        Behavior::Delay(Duration::from_secs(30), records("Slowpoke", 1)),
    );
    let options = DispatchOptions {
        light_timeout: Duration::from_millis(50),
        heavy_timeout: Duration::from_millis(50),
        ..fast_options()
    };

    let result = dispatcher(light, heavy, options)
        .run(vec![site("Slowpoke", Strategy::LightCustom)], &CancellationToken::new())
        .await;

    assert!(result.records.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert_eq!(
        result.failures[0].error,
        ExtractionError::Timeout {
            after: Duration::from_millis(50)
        }
    );
}

#[tokio::test]
async fn test_panicking_extractors_are_contained() {
    let light = Arc::new(
        FakeLight::new()
            .on("Acme", Behavior::Panic)
            .on("Bolt", Behavior::Records(records("Bolt", 1))),
    );
    let heavy = FakeHeavy::new().on("Acme", Behavior::Panic);
    let probe = Arc::clone(&heavy.probe);

    let sites = vec![
        site("Acme", Strategy::LightCustom),
        site("Bolt", Strategy::LightCustom),
    ];
    let result = dispatcher(light, heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].site, "Acme");
    assert!(matches!(
        &result.failures[0].error,
        ExtractionError::Panicked(msg) if msg.contains("browser extractor blew up")
    ));
    // A panic inside the phase still closes the runtime
    assert_eq!(probe.closes(), 1);
}

#[tokio::test]
async fn test_output_follows_registry_order_not_completion_order() {
    // Earlier sites finish last
    let light = Arc::new(
        FakeLight::new()
            .on("Acme", Behavior::Delay(Duration::from_millis(150), records("Acme", 1)))
            .on("Bolt", Behavior::Delay(Duration::from_millis(75), records("Bolt", 1)))
            .on("Cirrus", Behavior::Records(records("Cirrus", 1))),
    );
    let heavy = FakeHeavy::new()
        .on("Delta", Behavior::Delay(Duration::from_millis(100), records("Delta", 1)))
        .on("Echo", Behavior::Records(records("Echo", 1)));

    let sites = vec![
        site("Acme", Strategy::LightCustom),
        site("Bolt", Strategy::LightCustom),
        site("Cirrus", Strategy::LightCustom),
        site("Delta", Strategy::Heavy),
        site("Echo", Strategy::Heavy),
    ];
    let result = dispatcher(light, heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    let firms: Vec<_> = result.records.iter().map(|r| r.firm.as_str()).collect();
    assert_eq!(firms, ["Acme", "Bolt", "Cirrus", "Delta", "Echo"]);
}

#[tokio::test]
async fn test_identical_inputs_serialize_identically() {
    async fn run_once() -> String {
        let light = Arc::new(
            FakeLight::new()
                .on("Acme", Behavior::Delay(Duration::from_millis(20), records("Acme", 3)))
                .on("Bolt", Behavior::Fail(ExtractionError::Network("reset".into())))
                .on("Cirrus", Behavior::Records(records("Cirrus", 2))),
        );
        let heavy = FakeHeavy::new()
            .on("Bolt", Behavior::Fail(ExtractionError::Parse("no cards".into())))
            .on("Delta", Behavior::Records(records("Delta", 1)));
        let sites = vec![
            site("Acme", Strategy::LightStandard),
            site("Bolt", Strategy::LightCustom),
            site("Cirrus", Strategy::LightCustom),
            site("Delta", Strategy::Heavy),
        ];

        let result = dispatcher(light, heavy, fast_options())
            .run(sites, &CancellationToken::new())
            .await;
        serde_json::to_string(&result).unwrap()
    }

    let first = run_once().await;
    let second = run_once().await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_concurrency_caps_are_respected() {
    let names: Vec<String> = (0..12).map(|i| format!("Firm{i}")).collect();
    let mut light = FakeLight::new();
    let mut heavy = FakeHeavy::new();
    for name in &names {
        light = light.on(name, Behavior::Delay(Duration::from_millis(40), Vec::new()));
        heavy = heavy.on(name, Behavior::Delay(Duration::from_millis(40), Vec::new()));
    }
    let light = Arc::new(light);
    let probe = Arc::clone(&heavy.probe);
    let options = DispatchOptions {
        light_concurrency: 3,
        heavy_concurrency: 2,
        max_per_domain: 8,
        ..fast_options()
    };

    let sites = names.iter().map(|n| site(n, Strategy::LightCustom)).collect();
    let result = dispatcher(Arc::clone(&light), heavy, options)
        .run(sites, &CancellationToken::new())
        .await;

    assert!(result.is_empty());
    assert_eq!(light.gauge.calls(), 12);
    assert!(light.gauge.peak() <= 3, "light peak {}", light.gauge.peak());
    assert_eq!(probe.gauge.calls(), 12);
    assert!(probe.gauge.peak() <= 2, "heavy peak {}", probe.gauge.peak());
}

#[tokio::test]
async fn test_per_domain_cap_limits_shared_hosts() {
    use jobscrape::registry::SiteDescriptor;
    use url::Url;

    let mut light = FakeLight::new();
    let sites: Vec<SiteDescriptor> = (0..6)
        .map(|i| {
            let name = format!("Board{i}");
            light = std::mem::take(&mut light)
                .on(&name, Behavior::Delay(Duration::from_millis(40), records(&name, 1)));
            let url = Url::parse(&format!("https://boards.greenhouse.io/board{i}")).unwrap();
            SiteDescriptor::new(name, url, Strategy::LightStandard)
        })
        .collect();
    let light = Arc::new(light);
    let options = DispatchOptions {
        light_concurrency: 6,
        max_per_domain: 2,
        ..fast_options()
    };

    let result = dispatcher(Arc::clone(&light), FakeHeavy::new(), options)
        .run(sites, &CancellationToken::new())
        .await;

    assert_eq!(result.records.len(), 6);
    assert!(light.gauge.peak() <= 2, "same-host peak {}", light.gauge.peak());
}

#[tokio::test]
async fn test_runtime_launched_and_closed_once_for_many_sites() {
    let heavy = FakeHeavy::new();
    let probe = Arc::clone(&heavy.probe);
    let sites = (0..7)
        .map(|i| site(&format!("Firm{i}"), if i % 2 == 0 { Strategy::Heavy } else { Strategy::LightCustom }))
        .collect();

    dispatcher(Arc::new(FakeLight::new()), heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    assert_eq!(probe.launches(), 1);
    assert_eq!(probe.closes(), 1);
    assert_eq!(probe.gauge.calls(), 7);
}

#[tokio::test]
async fn test_interrupt_returns_partial_results() {
    let light = Arc::new(
        FakeLight::new()
            .on("Acme", Behavior::Records(records("Acme", 1)))
            .on("Bolt", Behavior::Delay(Duration::from_secs(1), records("Bolt", 1))),
    );
    let heavy = FakeHeavy::new();
    let probe = Arc::clone(&heavy.probe);

    let sites = vec![
        site("Acme", Strategy::LightStandard),
        site("Bolt", Strategy::LightCustom),
        site("Cirrus", Strategy::Heavy),
    ];
    let cancel = CancellationToken::new();
    let trigger = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    let result = dispatcher(light, heavy, fast_options()).run(sites, &cancel).await;
    trigger.await.unwrap();

    assert!(result.interrupted);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].firm, "Acme");

    let failed: Vec<_> = result.failures.iter().map(|f| f.site.as_str()).collect();
    assert_eq!(failed, ["Bolt", "Cirrus"]);
    assert!(result.failures.iter().all(|f| f.error == ExtractionError::Cancelled));

    // The browser phase never started
    assert_eq!(probe.launches(), 0);
}

#[tokio::test]
async fn test_interrupt_during_browser_phase_still_closes_runtime() {
    let heavy = FakeHeavy::new().on(
        "Cirrus",
        Behavior::Delay(Duration::from_secs(30), records("Cirrus", 1)),
    );
    let probe = Arc::clone(&heavy.probe);
    let cancel = CancellationToken::new();
    let trigger = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    let result = dispatcher(Arc::new(FakeLight::new()), heavy, fast_options())
        .run(vec![site("Cirrus", Strategy::Heavy)], &cancel)
        .await;
    trigger.await.unwrap();

    assert!(result.interrupted);
    assert_eq!(result.failures[0].error, ExtractionError::Cancelled);
    assert_eq!(probe.launches(), 1);
    assert_eq!(probe.closes(), 1);
}

#[tokio::test]
async fn test_sites_without_rules_fail_before_runtime_launch() {
    let light = Arc::new(FakeLight::new().on("Bolt", Behavior::Empty));
    let heavy = FakeHeavy::new().on("Cirrus", Behavior::Records(records("Cirrus", 1)));
    let probe = Arc::clone(&heavy.probe);

    let sites = vec![
        bare_site("Cirrus", Strategy::Heavy),
        bare_site("Bolt", Strategy::LightCustom),
    ];
    let result = dispatcher(light, heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    assert!(result.records.is_empty());
    assert_eq!(result.failures.len(), 2);
    for failure in &result.failures {
        assert_eq!(failure.error, ExtractionError::missing_rules(&failure.site));
    }
    assert_eq!(probe.launches(), 0);
    assert_eq!(probe.closes(), 0);
}

#[tokio::test]
async fn test_missing_rules_are_not_masked_by_launch_failure() {
    let heavy = FakeHeavy::new()
        .failing_launch(ExtractionError::RuntimeUnavailable("no chromium".into()));
    let probe = Arc::clone(&heavy.probe);

    let sites = vec![
        bare_site("Cirrus", Strategy::Heavy),
        site("Delta", Strategy::Heavy),
    ];
    let result = dispatcher(Arc::new(FakeLight::new()), heavy, fast_options())
        .run(sites, &CancellationToken::new())
        .await;

    assert_eq!(probe.launches(), 1);
    assert_eq!(result.failures[0].site, "Cirrus");
    assert_eq!(result.failures[0].error.kind(), "configuration");
    assert_eq!(result.failures[1].site, "Delta");
    assert_eq!(result.failures[1].error.kind(), "runtime_unavailable");
}

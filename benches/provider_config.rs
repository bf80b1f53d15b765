//! Benchmark for provider config decode, injection and extraction
//!
//! Runs once per machine per reconcile, across many failure domains.

use control_plane_machine_config::crd::{
    InfrastructureSpec, InfrastructureStatus, PlatformSpec, PlatformStatus, VSpherePlatformSpec,
};
use control_plane_machine_config::{
    new_provider_config, FailureDomain, FailureDomainPlacement, Infrastructure, PlatformType,
    VSpherePlatformFailureDomainSpec, VSpherePlatformTopology,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn infrastructure(zones: usize) -> Infrastructure {
    let failure_domains = (0..zones)
        .map(|i| VSpherePlatformFailureDomainSpec {
            name: format!("fd-{:03}", i),
            region: "region".to_string(),
            zone: format!("zone-{:03}", i),
            server: "vcenter.example.com".to_string(),
            topology: VSpherePlatformTopology {
                datacenter: "dc1".to_string(),
                compute_cluster: format!("/dc1/host/cluster-{:03}", i),
                networks: vec![format!("network-{:03}", i)],
                datastore: format!("/dc1/datastore/ds-{:03}", i),
                resource_pool: format!("/dc1/host/cluster-{:03}/Resources", i),
                ..Default::default()
            },
        })
        .collect();

    Infrastructure::new_cluster(
        InfrastructureSpec {
            platform_spec: PlatformSpec {
                platform_type: Some(PlatformType::VSphere),
                vsphere: Some(VSpherePlatformSpec { failure_domains }),
            },
        },
        InfrastructureStatus {
            infrastructure_name: "bench-abc12".to_string(),
            platform_status: Some(PlatformStatus {
                platform_type: PlatformType::VSphere,
            }),
        },
    )
}

fn payload() -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "apiVersion": "machine.openshift.io/v1beta1",
        "kind": "VSphereMachineProviderSpec",
        "credentialsSecret": {"name": "vsphere-cloud-credentials"},
        "userDataSecret": {"name": "master-user-data"},
        "template": "bench-abc12-rhcos",
        "workspace": {"datacenter": "dc1", "server": "vcenter.example.com"},
        "network": {"devices": [{"networkName": "vm-network"}]},
        "numCPUs": 4,
        "memoryMiB": 16384,
        "diskGiB": 120
    }))
    .expect("static payload")
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("provider_config");
    group.throughput(Throughput::Elements(1));

    let infra = infrastructure(3);
    let raw = payload();

    group.bench_function("decode_strict", |b| {
        b.iter(|| {
            let _ = new_provider_config(black_box(&raw), &infra);
        });
    });

    group.finish();
}

fn bench_inject_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("provider_config");
    group.throughput(Throughput::Elements(1));

    let infra = infrastructure(64);
    let config = new_provider_config(&payload(), &infra).expect("valid payload");
    let target = FailureDomain::vsphere("fd-063");

    group.bench_function("inject_last_of_64", |b| {
        b.iter(|| {
            let _ = config.inject_failure_domain(black_box(&target));
        });
    });

    let injected = config.inject_failure_domain(&target);
    group.bench_function("extract_last_of_64", |b| {
        b.iter(|| {
            let _ = black_box(&injected).extract_failure_domain();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_inject_extract);
criterion_main!(benches);

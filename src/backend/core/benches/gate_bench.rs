//! Benchmarks for route matching and request gate decisions.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use innsight_core::middleware::RequestGate;
use innsight_core::rbac::{Capabilities, IdentityClaims, Permission, Role, RoutePolicyTable};

const PATHS: [&str; 6] = [
    "/admin/users",
    "/reports/new",
    "/reports/2024/q1?tab=revpar",
    "/kpis",
    "/login?from=%2Fdashboard",
    "/api/session",
];

fn claims(roles: &[&str]) -> IdentityClaims {
    IdentityClaims::new("bench", roles.iter().map(|r| r.to_string()).collect())
}

fn bench_route_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("route_matching");
    let table = RoutePolicyTable::default();
    for path in PATHS {
        group.bench_with_input(BenchmarkId::from_parameter(path), path, |b, p| {
            b.iter(|| black_box(table.required_roles(p)));
        });
    }
    group.finish();
}

fn bench_gate_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("gate_evaluate");
    let gate = RequestGate::default();
    let analyst = claims(&["analyst"]);
    for (label, identity) in [("anonymous", None), ("analyst", Some(&analyst))] {
        group.throughput(Throughput::Elements(PATHS.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &identity, |b, id| {
            b.iter(|| {
                for path in PATHS {
                    black_box(gate.evaluate(path, *id));
                }
            });
        });
    }
    group.finish();
}

fn bench_capabilities(c: &mut Criterion) {
    let mut group = c.benchmark_group("capabilities");
    for role in Role::all() {
        group.bench_with_input(BenchmarkId::from_parameter(role), &role, |b, r| {
            b.iter(|| {
                let caps = Capabilities::from_claims(Some(claims(&[r.as_str()])));
                black_box(caps.has_permission(Permission::CreateReports));
                black_box(caps.snapshot())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_route_matching, bench_gate_evaluate, bench_capabilities);
criterion_main!(benches);

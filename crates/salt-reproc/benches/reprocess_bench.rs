// -------------------------------------------------------------------------
// SCPN Salt Loop -- Reprocessing Engine Benchmark
// Times one full graph walk (parse once, reprocess per iteration) over a
// three-stage extraction train with a several-hundred-nuclide inventory.
// -------------------------------------------------------------------------

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use indexmap::IndexMap;
use std::hint::black_box;

use salt_reproc::engine::reprocess;
use salt_reproc::graph::ProcessGraph;
use salt_reproc::process::ProcessLibrary;
use salt_types::material::Material;
use salt_types::nuclide::zzaaam_to_name;

/// Synthetic inventory spanning the fission-product mass range so the
/// benchmark does not depend on external decks.
fn make_core(nuclide_count: usize) -> Material {
    let mut comp = IndexMap::new();
    let mut z = 30u32;
    let mut a = 70u32;
    for i in 0..nuclide_count {
        let name = zzaaam_to_name(z * 10_000 + a * 10).expect("synthetic nuclide");
        comp.insert(name, 10.0 + i as f64);
        a += 1;
        if a > z * 2 + 20 {
            z += 1;
            a = z * 2 - 10;
        }
    }
    let mut core = Material::from_composition(comp);
    core.volume = 4.87e7;
    core.renormalize();
    core
}

fn make_library() -> ProcessLibrary {
    ProcessLibrary::from_json(
        r#"{
            "processes": {
                "sparger": {
                    "kind": "sparger",
                    "mass_transfer_coeff": 0.057,
                    "interfacial_area": 8.8,
                    "contactor_volume": 1.0e5,
                    "salt_flowrate": 2.0e4,
                    "gas_flowrate": 5.0e3,
                    "henry_factor": 3.9e-2
                },
                "entrainment_separator": {
                    "kind": "separator",
                    "separation_factor": 10.0,
                    "gas_fraction": 0.05
                },
                "nickel_filter": {
                    "kind": "fixed",
                    "efficiency": { "Se": 1.0, "Nb": 0.99, "Mo": 0.99, "Tc": 0.99 }
                }
            }
        }"#,
    )
    .expect("bench library")
}

fn bench_reprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("reprocess_graph_walk");
    let library = make_library();
    let graph = ProcessGraph::parse(
        r#"digraph {
            core -> sparger;
            sparger -> entrainment_separator [label="0.9"];
            sparger -> core [label="0.1"];
            entrainment_separator -> nickel_filter;
            nickel_filter -> core;
        }"#,
    )
    .expect("bench graph");
    let order = graph.resolve().expect("bench order");

    for &n in &[64usize, 512usize] {
        let core = make_core(n);
        group.bench_with_input(
            BenchmarkId::new("three_stage", format!("{n}_nuclides")),
            &core,
            |b, core| {
                b.iter(|| {
                    let out = reprocess(core, &graph, &order, &library, 259_200.0)
                        .expect("reprocess should not error");
                    black_box(out.extracted_mass);
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_reprocess);
criterion_main!(benches);

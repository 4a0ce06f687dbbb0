use approx::assert_relative_eq;
use hm_map::{
    Arg, BinIndex, Collation, Dispatched, Error, IdentityHash, Map, MapOp, MapSet,
    MultiDimBinning, OneDimBinning, Selection, UFloat, Value,
};
use ndarray::{ArrayD, IxDyn, array};

fn binning() -> MultiDimBinning {
    MultiDimBinning::new(vec![
        OneDimBinning::linear("reco_energy", 2, 1.0, 3.0).unwrap(),
        OneDimBinning::linear("reco_coszen", 3, -1.0, 1.0).unwrap(),
    ])
    .unwrap()
}

fn filled(name: &str, value: f64) -> Map {
    Map::from_nominal(name, ArrayD::from_elem(IxDyn(&[2, 3]), value), binning()).build().unwrap()
}

#[test]
fn operands_are_aligned_by_name() {
    let lhs = MapSet::new(vec![filled("nue", 1.0), filled("numu", 2.0)]);
    let rhs = MapSet::new(vec![filled("numu", 20.0), filled("nue", 10.0)]);
    let sum = (&lhs + &rhs).unwrap();
    assert_eq!(sum.names(), vec!["nue", "numu"]);
    assert!(*sum.by_name("nue").unwrap() == 11.0);
    assert!(*sum.by_name("numu").unwrap() == 22.0);
}

#[test]
fn operands_are_aligned_by_position() {
    let lhs = MapSet::new(vec![filled("nue", 1.0), filled("numu", 2.0)])
        .with_collation(Collation::ByPosition);
    let rhs = MapSet::new(vec![filled("bkg_a", 20.0), filled("bkg_b", 10.0)]);
    let sum = (&lhs + &rhs).unwrap();
    assert_eq!(sum.names(), vec!["nue", "numu"]);
    assert!(*sum.by_name("nue").unwrap() == 21.0);
    assert!(*sum.by_name("numu").unwrap() == 12.0);
    assert_eq!(sum.collation(), Collation::ByPosition);

    let short = MapSet::new(vec![filled("only", 1.0)]);
    assert!(matches!(&lhs * &short, Err(Error::Index(_))));
}

#[test]
fn missing_partner_aborts_dispatch() {
    let lhs = MapSet::new(vec![filled("nue", 1.0), filled("nutau", 2.0)]);
    let rhs = MapSet::new(vec![filled("nue", 1.0)]);
    assert!(matches!(&lhs - &rhs, Err(Error::NotFound(_))));
}

#[test]
fn scalar_and_array_arguments_are_broadcast() {
    let set = MapSet::new(vec![filled("nue", 1.0), filled("numu", 2.0)]).with_name("signal");
    let scaled = (&set * UFloat::new(3.0, 0.0)).unwrap();
    assert!(*scaled.by_position(1).unwrap() == 6.0);
    assert_eq!(scaled.name(), Some("signal"));

    let offsets = array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]].into_dyn();
    let shifted = (&set + &offsets).unwrap();
    assert_eq!(shifted.by_name("nue").unwrap().get(&[1, 0]), Some(UFloat::exact(3.0)));

    let reflected = set.rsub(10.0).unwrap();
    assert!(*reflected.by_name("numu").unwrap() == 8.0);
}

#[test]
fn property_dispatch_is_keyed_by_member_name() {
    let mut set = MapSet::new(vec![filled("nue", 1.0), filled("numu", 2.0)]);
    let shapes = set.apply_to_maps(MapOp::Shape, &[]).unwrap().into_collated().unwrap();
    assert_eq!(shapes[0], ("nue".to_string(), Value::Shape(vec![2, 3])));

    let hashes = set.apply_to_maps(MapOp::Hash, &[]).unwrap();
    let Dispatched::Collated(hashes) = hashes else {
        panic!("properties are collated");
    };
    assert!(hashes.iter().all(|(_, h)| *h == Value::None));

    let h = IdentityHash::from("cafe");
    set.set_hashes(Some(&h)).unwrap();
    assert!(set.hashes().iter().all(|x| *x == Some(&h)));
}

#[test]
fn bin_index_is_applied_to_every_member() {
    let set = MapSet::new(vec![filled("nue", 1.0), filled("numu", 2.0)]);
    let sub = set.index_bins(&BinIndex::from((1usize, 1usize..3))).unwrap();
    assert_eq!(sub.len(), 2);
    assert!(sub.iter().all(|m| m.shape() == &[1, 2]));
}

#[test]
fn slicing_returns_map_or_collection() {
    let set = MapSet::new(vec![filled("a", 1.0), filled("b", 2.0), filled("c", 3.0)]);
    assert!(matches!(set.slice(-1_isize), Ok(Selection::Map(m)) if m.name() == "c"));
    match set.slice(1usize..).unwrap() {
        Selection::Set(rest) => assert_eq!(rest.names(), vec!["b", "c"]),
        Selection::Map(_) => panic!("expected a collection"),
    }
}

#[test]
fn metrics_sum_over_members() {
    let data = MapSet::new(vec![filled("nue", 3.0), filled("numu", 4.0)]);
    let mc = MapSet::new(vec![filled("numu", 4.0), filled("nue", 2.0)]);
    let per_map = data.chi2_per_map(&mc).unwrap();
    assert_eq!(per_map[0].0, "nue");
    assert_relative_eq!(per_map[0].1, 6.0 * 0.5, epsilon = 1e-12);
    assert_eq!(per_map[1].1, 0.0);
    assert_relative_eq!(data.chi2_total(&mc).unwrap(), 3.0, epsilon = 1e-12);

    let llh_total = data.llh_total(&mc).unwrap();
    let llh_sum: f64 = data.llh_per_map(&mc).unwrap().iter().map(|(_, v)| v).sum();
    assert_relative_eq!(llh_total, llh_sum, epsilon = 1e-12);
}

#[test]
fn seeded_fluctuation_is_reproducible() {
    let set = MapSet::new(vec![filled("nue", 50.0), filled("numu", 500.0)]);
    let a = set.fluctuate("poisson", Some(11)).unwrap();
    let b = set.fluctuate("poisson", Some(11)).unwrap();
    assert_eq!(a, b);
    let out = set
        .apply_to_maps(MapOp::Fluctuate, &[Arg::Str("poisson"), Arg::Int(11)])
        .unwrap()
        .into_maps()
        .unwrap();
    assert_eq!(out, a);
}

#[test]
fn in_place_dispatch_is_all_or_nothing() {
    let mut set = MapSet::new(vec![filled("nue", 4.0), filled("numu", 9.0)]);
    set.set_poisson_errors().unwrap();
    assert_eq!(set.by_name("numu").unwrap().get(&[0, 0]), Some(UFloat::new(9.0, 3.0)));

    let err = set.apply_to_maps_mut(MapOp::SetName, &[Arg::Str("not a name")]);
    assert!(matches!(err, Err(Error::Validation(_))));
    assert_eq!(set.names(), vec!["nue", "numu"]);

    let err = set.apply_to_maps(MapOp::SetPoissonErrors, &[]);
    assert!(matches!(err, Err(Error::NotImplemented(_))));
}

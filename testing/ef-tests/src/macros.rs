/// Check SSZ and YAML decoding of ``$struct_name`` against the ``ssz_static`` vectors of
/// ``$fork``.
#[macro_export]
macro_rules! test_consensus_type {
    ($fork:ident, $struct_name:ident) => {
        $crate::test_consensus_type!($fork, $struct_name, $struct_name);
    };
    ($fork:ident, $struct_name:ident, $type:ty) => {
        paste::paste! {
            #[cfg(test)]
            #[allow(non_snake_case)]
            mod [<tests_ $fork _ $struct_name>] {
                use super::*;
                use rstest::rstest;
                use ssz::Encode;

                #[rstest]
                #[case("case_0")]
                #[case("case_1")]
                #[case("case_2")]
                #[case("case_3")]
                #[case("case_4")]
                fn test_type(#[case] case: &str) {
                    let path = format!(
                        "mainnet/tests/mainnet/{}/ssz_static/{}/ssz_random/{case}/",
                        stringify!($fork),
                        stringify!($struct_name)
                    );

                    let content = {
                        let value = std::fs::read_to_string(format!("{path}value.yaml"))
                            .expect("cannot find test asset");
                        serde_yaml::from_str::<$type>(&value).unwrap()
                    };

                    let serialized = format!("{path}serialized.ssz_snappy");
                    let serialized = std::path::Path::new(&serialized);
                    let ssz = $crate::utils::read_ssz_snappy_bytes(serialized)
                        .expect("cannot find test asset");
                    let decoded = $crate::utils::read_ssz_snappy::<$type>(serialized)
                        .expect("cannot decode test asset");

                    assert_eq!(ssz, content.as_ssz_bytes());
                    assert_eq!(content, decoded);
                }
            }
        }
    };
}

/// Check that a ``$fork`` ``BeaconState`` vector decodes through the revision dispatch.
#[macro_export]
macro_rules! test_raw_state {
    ($fork:ident, $revision:expr) => {
        paste::paste! {
            #[cfg(test)]
            mod [<tests_raw_state_ $fork>] {
                use super::*;
                use rstest::rstest;

                #[rstest]
                #[case("case_0")]
                #[case("case_1")]
                fn test_raw_state(#[case] case: &str) {
                    let path = format!(
                        "mainnet/tests/mainnet/{}/ssz_static/BeaconState/ssz_random/{case}/",
                        stringify!($fork)
                    );

                    let ssz = $crate::utils::read_ssz_snappy_bytes(
                        std::path::Path::new(&format!("{path}serialized.ssz_snappy")),
                    )
                    .expect("cannot find test asset");

                    let state = RawBeaconState::from_ssz_bytes($revision, &ssz).unwrap();
                    assert_eq!(state.revision(), $revision);
                    assert_eq!(state.validators().len(), state.balances().len());
                }
            }
        }
    };
}

//! Which validator library version a deployed library address expects.

use ethereum_types::{Address, H160};
use hex_literal::hex;

use crate::proof::UtilityVersion::{self, V1, V2};

type Libraries = &'static [(Address, UtilityVersion)];

/// Deployed validator libraries per network.
static VERSION_LOOKUP: &[(&str, Libraries)] = &[
    (
        "arbitrum",
        &[
            (H160(hex!("4ee2f9b7cf3a68966c370f3eb2c16613d3235245")), V1),
            (H160(hex!("50500ccd11e29f14008c7778a6ced655727a21c3")), V2),
            (H160(hex!("5b23e2bae5c5f00e804ea2c4c9abe601604378fa")), V2),
        ],
    ),
    (
        "avalanche",
        &[
            (H160(hex!("4ee2f9b7cf3a68966c370f3eb2c16613d3235245")), V1),
            (H160(hex!("50500ccd11e29f14008c7778a6ced655727a21c3")), V2),
            (H160(hex!("cbd35a9b849342ad34a71e072d9947d4afb4e164")), V2),
        ],
    ),
    (
        "bsc",
        &[
            (H160(hex!("4ee2f9b7cf3a68966c370f3eb2c16613d3235245")), V1),
            (H160(hex!("50500ccd11e29f14008c7778a6ced655727a21c3")), V2),
            (H160(hex!("cff08a35a5f27f306e2da99ff198db90f13def77")), V2),
        ],
    ),
    (
        "bsc-testnet",
        &[
            (H160(hex!("fc256f1007e67abbd027536818142823b4596a24")), V1),
            (H160(hex!("1de92e6b8e8b6b150ea8588fe387a4f5fb4da778")), V2),
            (H160(hex!("76860669184330e6966a61188cfbd13486c7a6a6")), V2),
            (H160(hex!("4652b61781f5ee79dad354ab5d249aa2b99b4def")), V2),
        ],
    ),
    (
        "bsc-sandbox",
        &[
            (H160(hex!("f96093134adf151889ed72517979b2cd7144a831")), V1),
            (H160(hex!("1751181f9af72b37934006bbe989238498067563")), V2),
            (H160(hex!("8953031e74a172586e89ddb40b7d269b9186e74c")), V2),
        ],
    ),
    (
        "ethereum",
        &[
            (H160(hex!("2d61dcdd36f10b22176e0433b86f74567d529aaa")), V1),
            (H160(hex!("50500ccd11e29f14008c7778a6ced655727a21c3")), V2),
            (H160(hex!("e9ae261d3aff7d3fccf38fa2d612dd3897e07b2d")), V2),
        ],
    ),
    (
        "fantom",
        &[
            (H160(hex!("3c2269811836af69497e5f486a85d7316753cf62")), V1),
            (H160(hex!("50500ccd11e29f14008c7778a6ced655727a21c3")), V2),
            (H160(hex!("6f1686189f32e78f1d83e7c6ed433fcebc3a5b51")), V2),
        ],
    ),
    (
        "fantom-testnet",
        &[
            (H160(hex!("0c3d09a7d86652f5599b836ce3db685a86513487")), V1),
            (H160(hex!("7669ac2bb50d567fd4bfb1cb5154b79c1e5e4a92")), V2),
            (H160(hex!("dafbd7a68e4ddcaa864c6a1171bd6030d0ca9a43")), V2),
            (H160(hex!("843986e31e0e3fea5eaf01086f36e7d85c458bb1")), V2),
        ],
    ),
    (
        "fantom-sandbox",
        &[
            (H160(hex!("54f51642779b9dbf48cc653c40499c82b8f261b3")), V1),
            (H160(hex!("01de566a13dc4be329351d930b0d9a569a495e46")), V2),
            (H160(hex!("f96093134adf151889ed72517979b2cd7144a831")), V2),
        ],
    ),
    (
        "avalanche-testnet",
        &[
            (H160(hex!("a7ac9fadbe9f51e7aa96751aa53f4cbb8a07b9ba")), V1),
            (H160(hex!("08c2e2b98d35973a4b2ca7ce8815cdb7c6f474f0")), V2),
            (H160(hex!("0a833b15305ce8b64946098db286710ace7bbe94")), V2),
            (H160(hex!("d81a1c5c52495a23f75d7269c17c73cebea61233")), V2),
        ],
    ),
    (
        "avalanche-sandbox",
        &[
            (H160(hex!("8953031e74a172586e89ddb40b7d269b9186e74c")), V1),
            (H160(hex!("4d7248986395d24ec777b16ca3fa32de64ec0330")), V2),
            (H160(hex!("4489a462f812d6dca0bde380ebdac12eb5a9e85a")), V2),
        ],
    ),
    (
        "polygon-testnet",
        &[
            (H160(hex!("2c7b02ffbc9602e8c04901609ef17cb1c4c2a7f7")), V1),
            (H160(hex!("3f6055024105d22b9400e025a1ca3259bd8b1893")), V2),
            (H160(hex!("cb97d107a87c5e172e075de94d7ef4498f6f06d2")), V2),
            (H160(hex!("d8b2de57ccfbbd5cd1713542cb6790fd2e33fed6")), V2),
        ],
    ),
    (
        "polygon-sandbox",
        &[
            (H160(hex!("369cc088dcedaaad27df0185c4f78caae42ff942")), V1),
            (H160(hex!("46f703c2a92874d5d526878a2ccc44e9431720a5")), V2),
            (H160(hex!("ee404727abfca5d08a2480b0b881745f25362828")), V2),
        ],
    ),
    (
        "optimism",
        &[
            (H160(hex!("4ee2f9b7cf3a68966c370f3eb2c16613d3235245")), V1),
            (H160(hex!("50500ccd11e29f14008c7778a6ced655727a21c3")), V2),
            (H160(hex!("5b23e2bae5c5f00e804ea2c4c9abe601604378fa")), V2),
        ],
    ),
    (
        "polygon",
        &[
            (H160(hex!("4ee2f9b7cf3a68966c370f3eb2c16613d3235245")), V1),
            (H160(hex!("50500ccd11e29f14008c7778a6ced655727a21c3")), V2),
            (H160(hex!("6f1686189f32e78f1d83e7c6ed433fcebc3a5b51")), V2),
        ],
    ),
];

/// The utility version the validator library at `library` on `network`
/// expects, if it is a known deployment.
pub fn utility_version_for(network: &str, library: &Address) -> Option<UtilityVersion> {
    known_libraries(network)
        .iter()
        .find(|(address, _)| address == library)
        .map(|(_, version)| *version)
}

/// Every known validator library of `network`. Empty for unknown networks.
pub fn known_libraries(network: &str) -> Libraries {
    VERSION_LOOKUP
        .iter()
        .find(|(name, _)| *name == network)
        .map(|(_, libraries)| *libraries)
        .unwrap_or_default()
}

//! Common test utilities for building procedures and driving sessions.
use annai::prelude::*;
use annai::source::{CodeDefinitions, DomainData};
use chrono::{TimeZone, Utc};

/// The ATM procedure's payout ceiling.
#[allow(dead_code)]
pub const PAYOUT_CEILING: f64 = 200_000.0;

/// The authoring-tool configuration document for the ATM procedure.
#[allow(dead_code)]
pub const ATM_CONFIGURATION_JSON: &str = include_str!("../data/atm_configuration.json");

/// Screen ids of the compiled ATM procedure.
#[allow(dead_code)]
pub mod atm {
    pub const LANGUAGE: u32 = 1;
    pub const TRANSACTION_TYPE: u32 = 2;
    pub const IS_DEPOSIT: u32 = 3;
    pub const IS_PAYMENT: u32 = 4;
    pub const IS_TRANSFER: u32 = 5;
    pub const DEPOSIT_AMOUNT: u32 = 6;
    pub const DEPOSIT_CONFIRM: u32 = 7;
    pub const PAYOUT_AMOUNT: u32 = 8;
    pub const PAYOUT_CONFIRM: u32 = 9;
    pub const COUNTRY: u32 = 10;
    pub const INSTITUTION: u32 = 11;
    pub const INSTITUTION_SEARCH: u32 = 12;
    pub const HOW_TO_SEARCH: u32 = 13;
    pub const BY_BRANCH_NAME: u32 = 14;
    pub const BY_BRANCH_CODE: u32 = 15;
    pub const BRANCH_NAME: u32 = 16;
    pub const BRANCH_CODE: u32 = 17;
    pub const ACCOUNT_NUMBER: u32 = 18;
    pub const TRANSFER_AMOUNT: u32 = 19;
    pub const TRANSFER_CONFIRM: u32 = 20;
    pub const BLOCKED: u32 = 21;
    pub const DONE: u32 = 22;
}

#[allow(dead_code)]
pub fn choice_node(id: &str, nav: &str, field: &str, code_id: &str) -> SourceNode {
    routed_choice_node(id, nav, field, code_id, RoutingTable::default())
}

#[allow(dead_code)]
pub fn routed_choice_node(
    id: &str,
    nav: &str,
    field: &str,
    code_id: &str,
    routes: RoutingTable,
) -> SourceNode {
    SourceNode::regular(
        id,
        id,
        RegularNode {
            nav_text: Some(nav.to_string()),
            items: vec![Item::ChoiceField(ChoiceField {
                field: field.to_string(),
                code_id: code_id.to_string(),
            })],
            routes,
            ..RegularNode::default()
        },
    )
}

#[allow(dead_code)]
pub fn input_node(id: &str, nav: &str, field: &str) -> SourceNode {
    input_node_with(id, nav, InputField::new(field))
}

#[allow(dead_code)]
pub fn input_node_with(id: &str, nav: &str, input: InputField) -> SourceNode {
    SourceNode::regular(
        id,
        id,
        RegularNode {
            nav_text: Some(nav.to_string()),
            items: vec![Item::InputField(input)],
            ..RegularNode::default()
        },
    )
}

/// A confirmation node showing `(label, field)` pairs.
#[allow(dead_code)]
pub fn confirm_node(id: &str, fields: &[(&str, &str)]) -> SourceNode {
    SourceNode::regular(
        id,
        id,
        RegularNode {
            nav_text: Some("以下の内容でよろしいですか？".to_string()),
            items: fields
                .iter()
                .map(|(label, field)| {
                    Item::DisplayField(DisplayField {
                        label: label.to_string(),
                        field: field.to_string(),
                        format: None,
                    })
                })
                .collect(),
            ..RegularNode::default()
        },
    )
}

#[allow(dead_code)]
pub fn terminal_node(id: &str, title: &str, marker: TerminalMarker) -> SourceNode {
    SourceNode::regular(
        id,
        title,
        RegularNode {
            nav_text: Some(title.to_string()),
            marker: Some(marker),
            ..RegularNode::default()
        },
    )
}

/// A switch whose i-th condition is `field EQUALS values[i]`.
#[allow(dead_code)]
pub fn equals_switch(
    id: &str,
    field: &str,
    branches: Vec<(&str, &str, Vec<SourceNode>)>,
) -> SourceNode {
    let conditions = branches
        .iter()
        .map(|(_, value, _)| SwitchCondition {
            combinator: annai::graph::Combinator::And,
            rules: vec![RuleDefinition::new(field, "EQUALS", *value)],
        })
        .collect();
    let branches = branches
        .into_iter()
        .map(|(branch_id, _, children)| Branch {
            id: branch_id.to_string(),
            children,
        })
        .collect();
    SourceNode::switch(id, id, SwitchNode { conditions, branches })
}

#[allow(dead_code)]
pub fn codes(entries: &[(&str, &[(&str, &str)])]) -> CodeDefinitions {
    entries
        .iter()
        .map(|(code_id, pairs)| {
            (
                code_id.to_string(),
                pairs
                    .iter()
                    .map(|(label, value)| CodeEntry::new(*label, *value))
                    .collect(),
            )
        })
        .collect()
}

/// The ATM procedure used across the test suite.
///
/// Screens are numbered as in [`atm`]. Payouts above [`PAYOUT_CEILING`]
/// end on the blocked terminal.
#[allow(dead_code)]
pub fn create_atm_procedure() -> ProcedureDefinition {
    let code_definitions = codes(&[
        ("language", &[("日本語", "Japanese"), ("English", "English"), ("中文", "Chinese")]),
        ("transactionType", &[("預入", "deposit"), ("払出", "payment"), ("振込", "transfer")]),
        ("recipientsCountry", &[("日本", "Japan"), ("その他", "Others")]),
        (
            "financialInstitution",
            &[
                ("みずほ銀行", "mizuho"),
                ("三菱UFJ銀行", "mitsubishufj"),
                ("三井住友銀行", "mitsuisumitomo"),
                ("りそな銀行", "risona"),
                ("埼玉りそな銀行", "saitamarisona"),
                ("ゆうちょ銀行", "yuuho"),
                ("その他", "others"),
            ],
        ),
        ("howToSearchBranch", &[("支店名", "branchName"), ("支店コード", "branchCode")]),
    ]);

    let mut domain_data = DomainData::new();
    for (index, name) in [
        "language",
        "transactionType",
        "depositAmount",
        "payoutAmount",
        "transferAmount",
    ]
    .iter()
    .enumerate()
    {
        let mut variable = DomainVariable::new(index as u32 + 1, *name);
        if *name == "payoutAmount" {
            variable = variable.with_ceiling(PAYOUT_CEILING);
        }
        domain_data.insert(name.to_string(), variable);
    }

    let transfer = vec![
        routed_choice_node(
            "country",
            "振込先の国を選択してください。",
            "recipientsCountry",
            "recipientsCountry",
            RoutingTable::default().route("Others", "blocked"),
        ),
        routed_choice_node(
            "institution",
            "振込先の金融機関を選択してください。",
            "financialInstitution",
            "financialInstitution",
            RoutingTable::default()
                .route("others", "institutionSearch")
                .otherwise("howToSearch"),
        ),
        input_node("institutionSearch", "金融機関名を入力してください。", "institutionName"),
        choice_node(
            "howToSearch",
            "支店の検索方法を選択してください。",
            "howToSearchBranch",
            "howToSearchBranch",
        ),
        equals_switch(
            "branchSearch",
            "howToSearchBranch",
            vec![
                (
                    "byBranchName",
                    "branchName",
                    vec![input_node("branchName", "支店名を入力してください。", "branchName")],
                ),
                (
                    "byBranchCode",
                    "branchCode",
                    vec![input_node("branchCode", "支店コードを入力してください。", "branchCode")],
                ),
            ],
        ),
        input_node("accountNumber", "口座番号を入力してください。", "accountNumber"),
        input_node("transferAmount", "振込金額を入力してください。", "transferAmount"),
        confirm_node(
            "transferConfirm",
            &[
                ("取引種別", "transactionType"),
                ("振込先金融機関", "financialInstitution"),
                ("振込金額", "transferAmount"),
            ],
        ),
    ];

    let workflow = vec![
        SourceNode::group(
            "main",
            "未設定",
            vec![
                choice_node("language", "言語を選択してください。", "language", "language"),
                choice_node(
                    "transactionType",
                    "ご希望の取引を選択してください。",
                    "transactionType",
                    "transactionType",
                ),
                equals_switch(
                    "transactionSwitch",
                    "transactionType",
                    vec![
                        (
                            "deposit",
                            "deposit",
                            vec![
                                input_node(
                                    "depositAmount",
                                    "預入金額を入力してください。",
                                    "depositAmount",
                                ),
                                confirm_node(
                                    "depositConfirm",
                                    &[
                                        ("取引種別", "transactionType"),
                                        ("預入金額", "depositAmount"),
                                    ],
                                ),
                            ],
                        ),
                        (
                            "payment",
                            "payment",
                            vec![
                                input_node(
                                    "payoutAmount",
                                    "払出金額を入力してください。",
                                    "payoutAmount",
                                ),
                                confirm_node(
                                    "payoutConfirm",
                                    &[
                                        ("取引種別", "transactionType"),
                                        ("払出金額", "payoutAmount"),
                                    ],
                                ),
                            ],
                        ),
                        ("transfer", "transfer", transfer),
                    ],
                ),
            ],
        ),
        terminal_node("blocked", "手続き不可", TerminalMarker::Blocked),
        terminal_node("done", "手続き完了", TerminalMarker::Success),
    ];

    ProcedureDefinition {
        workflow,
        code_definitions,
        domain_data,
    }
}

#[allow(dead_code)]
pub fn compile_atm() -> DialogueGraph {
    compile(&create_atm_procedure()).expect("ATM procedure should compile")
}

#[allow(dead_code)]
pub fn fixed_clock() -> Box<FixedClock> {
    Box::new(FixedClock(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()))
}

//! Keyword-based technology-domain classification of asset titles.
//!
//! Titles are lower-cased and checked against each domain's keywords. A
//! title counts at most once per domain, however many keywords hit.
//!
//! Keywords containing CJK text match as plain substrings, since those
//! titles have no word separators. Latin keywords and the English aliases
//! must sit on token boundaries (an optional plural `s` is allowed), so
//! "erp" does not fire inside "interpolation".
//!
//! The scan is synchronous and checks a [`CancellationToken`] between titles
//! so a caller enforcing a deadline can stop it.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// One technology domain and the keywords that select it.
pub struct DomainTable {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    /// English phrases for titles filed in English.
    pub aliases: &'static [&'static str],
}

/// Static domain tables.
pub const DOMAINS: &[DomainTable] = &[
    DomainTable {
        name: "foundational_software",
        keywords: &[
            "操作系统", "数据库", "中间件", "编译器", "虚拟机", "文件系统", "分布式存储",
            "容错机制", "事务处理", "查询优化", "内存管理", "安全沙箱",
        ],
        aliases: &[
            "operating system", "database", "middleware", "compiler", "virtual machine",
            "file system", "distributed storage", "fault tolerance", "transaction processing",
            "query optimization", "memory management", "security sandbox",
        ],
    },
    DomainTable {
        name: "cloud_computing",
        keywords: &[
            "容器编排", "微服务", "服务网格", "无服务器架构", "云原生", "Kubernetes",
            "服务发现", "弹性伸缩", "多租户隔离", "混合云", "边缘计算",
        ],
        aliases: &[
            "container orchestration", "microservice", "service mesh",
            "serverless architecture", "cloud native", "service discovery", "autoscaling",
            "multi-tenant isolation", "hybrid cloud", "edge computing",
        ],
    },
    DomainTable {
        name: "frontend",
        keywords: &[
            "React", "Vue", "TypeScript", "WebAssembly", "响应式设计", "SPA", "PWA",
            "前端性能优化", "跨平台框架", "微前端", "低代码可视化",
        ],
        aliases: &[
            "responsive design", "single-page application", "progressive web app",
            "frontend performance", "cross-platform framework", "micro-frontend",
            "low-code visual",
        ],
    },
    DomainTable {
        name: "backend_architecture",
        keywords: &[
            "高并发", "分布式锁", "消息队列", "API网关", "服务熔断", "负载均衡", "缓存穿透",
            "读写分离", "分库分表", "CQRS", "事件溯源",
        ],
        aliases: &[
            "high concurrency", "distributed lock", "message queue", "api gateway",
            "circuit breaker", "load balancing", "cache penetration", "read-write splitting",
            "database sharding", "event sourcing",
        ],
    },
    DomainTable {
        name: "developer_tooling",
        keywords: &[
            "IDE插件", "CI/CD", "静态分析", "代码审查", "版本控制", "调试工具", "性能剖析",
            "依赖管理", "自动化测试", "混沌工程", "监控告警",
        ],
        aliases: &[
            "ide plugin", "static analysis", "code review", "version control", "debugger",
            "profiling", "dependency management", "automated testing", "chaos engineering",
            "monitoring and alerting",
        ],
    },
    DomainTable {
        name: "data_processing",
        keywords: &[
            "Spark", "Flink", "实时计算", "数据湖", "特征工程", "OLAP", "数据治理", "隐私计算",
            "流批一体", "数据血缘", "质量监控",
        ],
        aliases: &[
            "real-time computing", "data lake", "feature engineering", "data governance",
            "privacy computing", "stream-batch", "data lineage", "quality monitoring",
        ],
    },
    DomainTable {
        name: "software_security",
        keywords: &[
            "漏洞扫描", "渗透测试", "加密算法", "零信任", "代码审计", "WAF", "沙箱隔离",
            "证书管理", "密钥轮换", "访问控制", "日志溯源",
        ],
        aliases: &[
            "vulnerability scanning", "penetration testing", "encryption algorithm",
            "zero trust", "code audit", "web application firewall", "sandbox isolation",
            "certificate management", "key rotation", "access control", "log tracing",
        ],
    },
    DomainTable {
        name: "ai_engineering",
        keywords: &[
            "模型部署", "MLOps", "特征存储", "在线推理", "A/B测试", "模型监控", "自动化标注",
            "联邦学习", "模型压缩", "知识蒸馏", "边缘推理",
        ],
        aliases: &[
            "model deployment", "feature store", "online inference", "a/b testing",
            "model monitoring", "automatic labeling", "federated learning", "model compression",
            "knowledge distillation", "edge inference",
        ],
    },
    DomainTable {
        name: "emerging_tech",
        keywords: &[
            "Web3.0", "低代码平台", "无代码开发", "RPA", "Serverless", "量子编程", "AI代码生成",
            "数字孪生", "元宇宙开发", "区块链智能合约",
        ],
        aliases: &[
            "low-code platform", "no-code", "robotic process automation", "quantum programming",
            "ai code generation", "digital twin", "metaverse development",
            "blockchain smart contract",
        ],
    },
    DomainTable {
        name: "industry_software",
        keywords: &[
            "ERP", "CRM", "SCM", "医疗信息化", "金融核心系统", "工业软件", "GIS系统", "CAD/CAE",
            "EDA工具链", "数字孪生平台",
        ],
        aliases: &[
            "supply chain management", "medical informatization", "core banking",
            "industrial software", "eda toolchain", "digital twin platform",
        ],
    },
    DomainTable {
        name: "semiconductors",
        keywords: &[
            "芯片", "半导体", "集成电路", "硅基", "晶圆", "光刻胶", "封装测试", "第三代半导体",
            "功率器件", "存储芯片", "射频芯片", "MEMS",
        ],
        aliases: &[
            "chip", "semiconductor", "integrated circuit", "silicon", "wafer", "photoresist",
            "packaging and testing", "third-generation semiconductor", "power device",
            "memory chip", "rf chip",
        ],
    },
    DomainTable {
        name: "new_energy",
        keywords: &[
            "电池", "太阳能", "光伏", "储能", "锂电池", "钠离子电池", "氢能源", "燃料电池",
            "超级电容", "风能", "智能电网", "能源互联网",
        ],
        aliases: &[
            "battery", "solar", "photovoltaic", "energy storage", "lithium", "sodium-ion",
            "hydrogen", "fuel cell", "supercapacitor", "wind power", "smart grid",
            "energy internet",
        ],
    },
    DomainTable {
        name: "artificial_intelligence",
        keywords: &[
            "AI", "人工智能", "机器学习", "深度学习", "神经网络", "自然语言处理", "计算机视觉",
            "强化学习", "知识图谱", "边缘AI", "联邦学习", "大模型",
        ],
        aliases: &[
            "artificial intelligence", "machine learning", "deep learning", "neural network",
            "natural language processing", "computer vision", "reinforcement learning",
            "knowledge graph", "edge ai", "federated learning", "large language model",
        ],
    },
    DomainTable {
        name: "biomedicine",
        keywords: &[
            "基因", "蛋白", "疫苗", "试剂", "药物", "细胞治疗", "基因编辑", "抗体药物",
            "生物标记物", "mRNA", "合成生物学", "器官芯片",
        ],
        aliases: &[
            "gene", "protein", "vaccine", "reagent", "drug", "cell therapy", "gene editing",
            "antibody", "biomarker", "synthetic biology", "organ-on-a-chip",
        ],
    },
    DomainTable {
        name: "blockchain",
        keywords: &[
            "区块链", "分布式账本", "智能合约", "加密货币", "DeFi", "NFT", "跨链协议",
            "零知识证明", "共识算法", "去中心化身份", "链上治理",
        ],
        aliases: &[
            "blockchain", "distributed ledger", "smart contract", "cryptocurrency",
            "cross-chain", "zero-knowledge proof", "consensus algorithm",
            "decentralized identity", "on-chain governance",
        ],
    },
    DomainTable {
        name: "telecommunications",
        keywords: &[
            "5G", "毫米波", "Massive MIMO", "网络切片", "边缘计算", "太赫兹通信", "卫星互联网",
            "空天地一体化", "URLLC", "O-RAN", "6G",
        ],
        aliases: &[
            "millimeter wave", "network slicing", "edge computing", "terahertz",
            "satellite internet", "space-air-ground",
        ],
    },
    DomainTable {
        name: "quantum",
        keywords: &[
            "量子计算", "量子比特", "量子纠缠", "量子加密", "量子算法", "量子模拟", "量子传感",
            "量子通信", "超导量子", "离子阱", "拓扑量子",
        ],
        aliases: &[
            "quantum computing", "qubit", "quantum entanglement", "quantum encryption",
            "quantum algorithm", "quantum simulation", "quantum sensing",
            "quantum communication", "superconducting quantum", "ion trap",
            "topological quantum",
        ],
    },
    DomainTable {
        name: "robotics",
        keywords: &[
            "工业机器人", "协作机器人", "SLAM", "运动控制", "柔性抓取", "人机交互",
            "仿生机器人", "无人机", "自主导航", "力觉反馈", "群体智能",
        ],
        aliases: &[
            "industrial robot", "collaborative robot", "motion control", "flexible grasping",
            "human-robot interaction", "bionic robot", "drone", "autonomous navigation",
            "force feedback", "swarm intelligence",
        ],
    },
    DomainTable {
        name: "advanced_manufacturing",
        keywords: &[
            "3D打印", "数控机床", "数字孪生", "工业互联网", "精密加工", "智能工厂",
            "预测性维护", "柔性生产", "复合材料", "无损检测", "工艺优化",
        ],
        aliases: &[
            "3d printing", "cnc machine", "digital twin", "industrial internet",
            "precision machining", "smart factory", "predictive maintenance",
            "flexible production", "composite material", "non-destructive testing",
            "process optimization",
        ],
    },
    DomainTable {
        name: "metaverse",
        keywords: &[
            "虚拟现实", "增强现实", "数字孪生", "虚拟化身", "空间计算", "脑机接口", "NFT",
            "沉浸式交互", "光场显示", "虚实融合", "Web3",
        ],
        aliases: &[
            "virtual reality", "augmented reality", "digital twin", "avatar",
            "spatial computing", "brain-computer interface", "immersive interaction",
            "light field display", "mixed reality",
        ],
    },
    DomainTable {
        name: "autonomous_driving",
        keywords: &[
            "激光雷达", "多模态融合", "高精地图", "V2X", "路径规划", "仿真测试", "车路协同",
            "影子模式", "端到端学习", "传感器标定",
        ],
        aliases: &[
            "lidar", "multimodal fusion", "high-definition map", "path planning",
            "simulation testing", "vehicle-road cooperation", "shadow mode",
            "end-to-end learning", "sensor calibration",
        ],
    },
    DomainTable {
        name: "green_tech",
        keywords: &[
            "碳捕捉", "生物降解", "循环经济", "清洁能源", "碳足迹", "生态修复", "可持续材料",
            "零碳建筑", "蓝碳", "气候模型",
        ],
        aliases: &[
            "carbon capture", "biodegradable", "circular economy", "clean energy",
            "carbon footprint", "ecological restoration", "sustainable material",
            "zero-carbon building", "blue carbon", "climate model",
        ],
    },
    DomainTable {
        name: "aerospace",
        keywords: &[
            "可重复火箭", "卫星星座", "高温合金", "电推进", "空间站", "高超声速", "复合材料",
            "在轨服务", "月球基地", "深空探测",
        ],
        aliases: &[
            "reusable rocket", "satellite constellation", "superalloy", "electric propulsion",
            "space station", "hypersonic", "composite material", "on-orbit servicing",
            "lunar base", "deep space exploration",
        ],
    },
    DomainTable {
        name: "cybersecurity",
        keywords: &[
            "零信任", "威胁检测", "数据加密", "APT防御", "隐私计算", "安全多方计算", "漏洞挖掘",
            "攻防演练", "安全运营", "区块链审计",
        ],
        aliases: &[
            "zero trust", "threat detection", "data encryption", "apt defense",
            "privacy computing", "secure multi-party computation", "vulnerability mining",
            "red team", "security operations", "blockchain audit",
        ],
    },
    DomainTable {
        name: "smart_city",
        keywords: &[
            "城市大脑", "智能交通", "智慧灯杆", "数字政务", "地下管网", "应急指挥", "社区治理",
            "智慧园区", "环境监测", "一网统管",
        ],
        aliases: &[
            "city brain", "intelligent transportation", "smart lamp post", "digital government",
            "underground pipe network", "emergency command", "community governance",
            "smart park", "environmental monitoring", "unified city management",
        ],
    },
];

/// Compiled form of one [`DomainTable`].
struct DomainMatcher {
    name: &'static str,
    /// Lower-cased keywords matched as substrings.
    fragments: Vec<String>,
    /// Alternation over the Latin keywords, anchored on token boundaries.
    words: Option<Regex>,
}

impl DomainMatcher {
    fn new(table: &DomainTable) -> Self {
        let (latin, fragments): (Vec<&str>, Vec<&str>) = table
            .keywords
            .iter()
            .chain(table.aliases)
            .copied()
            .partition(|kw| kw.is_ascii());

        let words = (!latin.is_empty()).then(|| {
            let alternatives: Vec<String> =
                latin.iter().map(|kw| regex::escape(&kw.to_lowercase())).collect();
            let pattern = format!(
                "(?:^|[^a-z0-9])(?:{})s?(?:$|[^a-z0-9])",
                alternatives.join("|")
            );
            Regex::new(&pattern).expect("escaped keywords form a valid pattern")
        });

        Self {
            name: table.name,
            fragments: fragments.iter().map(|kw| kw.to_lowercase()).collect(),
            words,
        }
    }

    /// `title` must already be lower-cased.
    fn matches(&self, title: &str) -> bool {
        self.fragments.iter().any(|f| title.contains(f.as_str()))
            || self.words.as_ref().is_some_and(|re| re.is_match(title))
    }
}

static MATCHERS: LazyLock<Vec<DomainMatcher>> =
    LazyLock::new(|| DOMAINS.iter().map(DomainMatcher::new).collect());

/// Number of assets whose title hit a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainCount {
    pub domain: &'static str,
    pub count: i64,
}

/// Count titles per domain.
///
/// Returns `None` if `cancel` fires before the scan finishes. The result is
/// sorted by count descending, ties broken by domain name.
pub fn classify<I>(titles: I, cancel: &CancellationToken) -> Option<Vec<DomainCount>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let matchers = &*MATCHERS;
    let mut counts: HashMap<&'static str, i64> = HashMap::new();
    for title in titles {
        if cancel.is_cancelled() {
            return None;
        }
        let lowered = title.as_ref().to_lowercase();
        for matcher in matchers.iter().filter(|m| m.matches(&lowered)) {
            *counts.entry(matcher.name).or_default() += 1;
        }
    }

    let mut result: Vec<DomainCount> = counts
        .into_iter()
        .map(|(domain, count)| DomainCount { domain, count })
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.domain.cmp(b.domain)));
    Some(result)
}

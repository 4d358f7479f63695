//! Curated skill vocabulary for deterministic extraction.
//!
//! Each entry is a canonical display name plus the lowercase surface forms that count as
//! a mention. Ambiguous short words ("go", "r", "c", "rest") are deliberately absent;
//! their unambiguous spellings are listed instead.

use super::skills::normalize_key;

pub struct VocabEntry {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

const fn entry(canonical: &'static str, aliases: &'static [&'static str]) -> VocabEntry {
    VocabEntry { canonical, aliases }
}

pub static VOCABULARY: &[VocabEntry] = &[
    // Languages
    entry("Python", &["python"]),
    entry("Java", &["java"]),
    entry("JavaScript", &["javascript"]),
    entry("TypeScript", &["typescript"]),
    entry("Go", &["golang"]),
    entry("Rust", &["rust"]),
    entry("C++", &["c++"]),
    entry("C#", &["c#"]),
    entry("Scala", &["scala"]),
    entry("Kotlin", &["kotlin"]),
    entry("Swift", &["swift"]),
    entry("Ruby", &["ruby"]),
    entry("PHP", &["php"]),
    entry("Bash", &["bash", "shell scripting"]),
    // Data stores
    entry("SQL", &["sql"]),
    entry("PostgreSQL", &["postgresql", "postgres"]),
    entry("MySQL", &["mysql"]),
    entry("MongoDB", &["mongodb"]),
    entry("Redis", &["redis"]),
    entry("Elasticsearch", &["elasticsearch"]),
    entry("Snowflake", &["snowflake"]),
    entry("BigQuery", &["bigquery"]),
    // Data engineering
    entry("Spark", &["spark", "pyspark"]),
    entry("Hadoop", &["hadoop"]),
    entry("Kafka", &["kafka"]),
    entry("Airflow", &["airflow"]),
    entry("Pandas", &["pandas"]),
    entry("NumPy", &["numpy"]),
    entry("Tableau", &["tableau"]),
    entry("Power BI", &["power bi", "powerbi"]),
    // Machine learning
    entry("Scikit-learn", &["scikit-learn", "scikit learn", "sklearn"]),
    entry("TensorFlow", &["tensorflow"]),
    entry("PyTorch", &["pytorch"]),
    entry("Keras", &["keras"]),
    entry("Machine Learning", &["machine learning"]),
    entry("Deep Learning", &["deep learning"]),
    entry("NLP", &["nlp", "natural language processing"]),
    entry("Computer Vision", &["computer vision"]),
    entry("LLM", &["llm", "large language model"]),
    entry("MLOps", &["mlops", "ml ops", "ml-ops"]),
    // Infrastructure
    entry("Docker", &["docker"]),
    entry("Kubernetes", &["kubernetes", "k8s"]),
    entry("AWS", &["aws", "amazon web services"]),
    entry("GCP", &["gcp", "google cloud"]),
    entry("Azure", &["azure"]),
    entry("Terraform", &["terraform"]),
    entry("Ansible", &["ansible"]),
    entry("CI/CD", &["ci/cd", "cicd", "ci-cd"]),
    entry("Jenkins", &["jenkins"]),
    entry("GitHub Actions", &["github actions"]),
    entry("Git", &["git"]),
    entry("Linux", &["linux"]),
    // Web and services
    entry("REST API", &["rest api", "restful"]),
    entry("GraphQL", &["graphql"]),
    entry("gRPC", &["grpc"]),
    entry("Microservices", &["microservice"]),
    entry("FastAPI", &["fastapi"]),
    entry("Flask", &["flask"]),
    entry("Django", &["django"]),
    entry("Spring Boot", &["spring boot"]),
    entry("Node.js", &["node.js", "nodejs"]),
    entry("React", &["react", "react.js", "reactjs"]),
    entry("Angular", &["angular"]),
    entry("Vue.js", &["vue", "vue.js", "vuejs"]),
    entry("HTML", &["html"]),
    entry("CSS", &["css"]),
];

/// Canonical display name for `name` when it is a known vocabulary skill.
pub fn canonical_name(name: &str) -> Option<&'static str> {
    let key = normalize_key(name);
    if key.is_empty() {
        return None;
    }
    VOCABULARY
        .iter()
        .find(|e| normalize_key(e.canonical) == key || e.aliases.iter().any(|a| normalize_key(a) == key))
        .map(|e| e.canonical)
}

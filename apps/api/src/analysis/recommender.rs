//! Recommender: deterministic per-skill suggestions from a static table.

use crate::analysis::skills::normalize_key;
use crate::models::analysis::{Improvement, ImprovementKind, Priority, Recommendation};

struct Template {
    key: &'static str,
    project_idea: &'static str,
    cv_bullet: &'static str,
    resources: &'static [&'static str],
}

static TEMPLATES: &[Template] = &[
    Template {
        key: "python",
        project_idea: "Write a command-line tool that cleans and summarizes a public CSV dataset",
        cv_bullet: "Built a Python CLI that automates data cleaning and reporting for public datasets",
        resources: &["docs.python.org/3/tutorial", "Automate the Boring Stuff with Python", "realpython.com"],
    },
    Template {
        key: "tensorflow",
        project_idea: "Train and export an image classifier with TensorFlow/Keras on a public dataset",
        cv_bullet: "Trained and deployed a TensorFlow image classifier with documented evaluation metrics",
        resources: &["tensorflow.org/tutorials", "TensorFlow Developer Certificate guide", "Deep Learning with Python (Chollet)"],
    },
    Template {
        key: "pytorch",
        project_idea: "Fine-tune a pretrained PyTorch model on a small custom dataset",
        cv_bullet: "Fine-tuned a pretrained PyTorch model and tracked experiments end to end",
        resources: &["pytorch.org/tutorials", "Dive into Deep Learning (d2l.ai)", "fast.ai Practical Deep Learning"],
    },
    Template {
        key: "mlops",
        project_idea: "Package a model behind an API with automated training, versioning and monitoring",
        cv_bullet: "Built an MLOps pipeline with automated retraining, model versioning and drift monitoring",
        resources: &["Made With ML (madewithml.com)", "MLflow documentation", "Google Cloud MLOps whitepaper"],
    },
    Template {
        key: "docker",
        project_idea: "Containerize a multi-service web app with Docker Compose",
        cv_bullet: "Containerized a multi-service application with Docker and Docker Compose",
        resources: &["docs.docker.com/get-started", "Docker Deep Dive (Poulton)", "Play with Docker labs"],
    },
    Template {
        key: "kubernetes",
        project_idea: "Deploy a containerized app to a local Kubernetes cluster with health checks and autoscaling",
        cv_bullet: "Deployed and autoscaled a containerized service on Kubernetes with rolling updates",
        resources: &["kubernetes.io/docs/tutorials", "Kubernetes Up & Running", "minikube quickstart"],
    },
    Template {
        key: "aws",
        project_idea: "Host a serverless API on AWS Lambda with API Gateway and DynamoDB",
        cv_bullet: "Built and deployed a serverless API on AWS (Lambda, API Gateway, DynamoDB)",
        resources: &["AWS Skill Builder", "AWS Well-Architected Framework", "AWS Cloud Practitioner Essentials"],
    },
    Template {
        key: "gcp",
        project_idea: "Deploy a containerized service to Cloud Run backed by BigQuery",
        cv_bullet: "Deployed a Cloud Run service on GCP with BigQuery analytics",
        resources: &["Google Cloud Skills Boost", "cloud.google.com/run/docs", "GCP Associate Cloud Engineer guide"],
    },
    Template {
        key: "sql",
        project_idea: "Design a normalized schema and write analytical queries over a sample dataset",
        cv_bullet: "Designed a relational schema and wrote analytical SQL queries with window functions",
        resources: &["SQLBolt", "Mode SQL Tutorial", "PostgreSQL documentation"],
    },
    Template {
        key: "ci/cd",
        project_idea: "Add a CI/CD pipeline that tests, builds and deploys a sample service on every push",
        cv_bullet: "Set up a CI/CD pipeline with automated tests, builds and deployments",
        resources: &["GitHub Actions documentation", "GitLab CI/CD quick start", "Continuous Delivery (Humble & Farley)"],
    },
    Template {
        key: "spark",
        project_idea: "Process a multi-gigabyte public dataset with Spark DataFrames",
        cv_bullet: "Processed large datasets with Apache Spark, optimizing joins and partitioning",
        resources: &["spark.apache.org/docs", "Learning Spark (O'Reilly)", "Databricks Community Edition"],
    },
    Template {
        key: "kafka",
        project_idea: "Build a producer/consumer pipeline streaming events through Kafka",
        cv_bullet: "Built an event streaming pipeline with Kafka producers and consumers",
        resources: &["kafka.apache.org/quickstart", "Confluent Developer courses", "Kafka: The Definitive Guide"],
    },
    Template {
        key: "terraform",
        project_idea: "Provision a small cloud environment entirely with Terraform modules",
        cv_bullet: "Provisioned cloud infrastructure as code with reusable Terraform modules",
        resources: &["developer.hashicorp.com/terraform/tutorials", "Terraform: Up & Running", "Terraform Registry"],
    },
    Template {
        key: "react",
        project_idea: "Build a single-page React app consuming a public REST API",
        cv_bullet: "Built a responsive React single-page application integrated with a REST API",
        resources: &["react.dev/learn", "Epic React", "MDN Web Docs"],
    },
    Template {
        key: "machinelearning",
        project_idea: "Build an end-to-end prediction model with proper validation on a Kaggle dataset",
        cv_bullet: "Built and validated a machine learning model with cross-validation and feature engineering",
        resources: &["Kaggle Learn", "Hands-On Machine Learning (Géron)", "scikit-learn user guide"],
    },
];

/// Builds one recommendation per missing skill, in input order.
/// Unknown skills get a generic template; duplicates produce duplicate entries.
pub fn recommend(missing_skills: &[String]) -> Vec<Recommendation> {
    missing_skills.iter().map(|skill| recommend_one(skill)).collect()
}

pub fn recommend_one(skill: &str) -> Recommendation {
    let skill = skill.trim();
    let key = normalize_key(skill);

    match TEMPLATES.iter().find(|t| t.key == key) {
        Some(t) => Recommendation {
            skill: skill.to_string(),
            project_idea: t.project_idea.to_string(),
            cv_bullet: t.cv_bullet.to_string(),
            resources: t.resources.iter().map(|r| r.to_string()).collect(),
        },
        None => Recommendation {
            skill: skill.to_string(),
            project_idea: format!("Build a small project to learn {skill}"),
            cv_bullet: format!("Worked with {skill} in a hands-on project"),
            resources: vec![
                format!("Official {skill} documentation"),
                format!("Introductory {skill} course"),
            ],
        },
    }
}

impl From<Recommendation> for Improvement {
    fn from(rec: Recommendation) -> Self {
        Improvement {
            kind: ImprovementKind::Recommendation,
            title: Some(rec.project_idea),
            description: None,
            keyword: Some(rec.skill),
            suggestion: Some(rec.cv_bullet),
            priority: Priority::High,
            resources: rec.resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_one_entry_per_skill_in_order() {
        let recs = recommend(&strings(&["TensorFlow", "ML Ops"]));
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].skill, "TensorFlow");
        assert_eq!(recs[1].skill, "ML Ops");
        assert!(recs[1].cv_bullet.contains("MLOps"));
    }

    #[test]
    fn test_duplicates_and_unknown_skills_are_kept() {
        let input = strings(&["Docker", "Quantum Basket Weaving", "docker", "Docker"]);
        let recs = recommend(&input);
        assert_eq!(recs.len(), input.len());
        for (rec, skill) in recs.iter().zip(&input) {
            assert_eq!(&rec.skill, skill);
        }
        assert!(recs[1].project_idea.contains("Quantum Basket Weaving"));
        assert!(!recs[1].resources.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(recommend(&[]).is_empty());
    }

    #[test]
    fn test_lookup_uses_normalized_key() {
        assert_eq!(recommend_one("k8s").project_idea, recommend_one("Kubernetes").project_idea);
        assert_eq!(recommend_one("CICD").cv_bullet, recommend_one("CI/CD").cv_bullet);
    }

    #[test]
    fn test_template_keys_are_normalized() {
        for t in TEMPLATES {
            assert_eq!(normalize_key(t.key), t.key);
        }
    }

    #[test]
    fn test_into_improvement() {
        let improvement: Improvement = recommend_one("SQL").into();
        assert_eq!(improvement.kind, ImprovementKind::Recommendation);
        assert_eq!(improvement.keyword.as_deref(), Some("SQL"));
        assert_eq!(improvement.priority, Priority::High);
        assert_eq!(improvement.resources.len(), 3);
    }
}

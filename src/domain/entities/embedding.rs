use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    pub fn new(vec: Vec<f32>) -> Self {
        Self(vec)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// False if any component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Unit-length copy. A zero vector stays zero and scores 0 against everything.
    pub fn normalized(&self) -> Embedding {
        let norm = self.norm();
        if norm == 0.0 {
            return self.clone();
        }
        Embedding(self.0.iter().map(|x| x / norm).collect())
    }

    pub fn dot(&self, other: &Embedding) -> f32 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }

        let norm_a = self.norm();
        let norm_b = other.norm();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        self.dot(other) / (norm_a * norm_b)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Self(vec)
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 2.0]);
        let c = Embedding::new(vec![3.0, 0.0]);

        assert!(a.cosine_similarity(&b).abs() < 1e-6);
        assert!((a.cosine_similarity(&c) - 1.0).abs() < 1e-6);
        assert_eq!(a.cosine_similarity(&Embedding::new(vec![1.0])), 0.0);
    }

    #[test]
    fn test_normalized_dot_matches_cosine() {
        let a = Embedding::new(vec![3.0, 4.0, 0.0]);
        let b = Embedding::new(vec![1.0, 2.0, 2.0]);

        let dot = a.normalized().dot(&b.normalized());
        assert!((dot - a.cosine_similarity(&b)).abs() < 1e-6);
        assert!((a.normalized().norm() - 1.0).abs() < 1e-6);
        assert_eq!(Embedding::new(vec![0.0, 0.0]).normalized().norm(), 0.0);
    }
}

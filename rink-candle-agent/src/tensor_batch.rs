use anyhow::{bail, Context, Result};
use candle_core::{Device, Tensor};
use rink_core::generic_replay_buffer::BatchBase;

/// A buffer consisting of a [`Tensor`].
///
/// Items are stacked along the first axis. The internal tensor is allocated on the CPU
/// at the first push, with the shape `[capacity, item_shape..]`.
#[derive(Clone, Debug)]
pub struct TensorBatch {
    buf: Option<Tensor>,
    capacity: usize,
}

impl TensorBatch {
    /// Wraps a tensor whose first axis is the batch axis.
    pub fn from_tensor(t: Tensor) -> Self {
        let capacity = t.dims().first().copied().unwrap_or(0);
        Self {
            buf: Some(t),
            capacity,
        }
    }

    /// Moves the internal tensor to the given device.
    pub fn to(&mut self, device: &Device) -> Result<()> {
        if let Some(buf) = &self.buf {
            self.buf = Some(buf.to_device(device)?);
        }
        Ok(())
    }

    /// Returns the internal tensor, if allocated.
    pub fn tensor(&self) -> Option<&Tensor> {
        self.buf.as_ref()
    }
}

impl BatchBase for TensorBatch {
    fn new(capacity: usize) -> Self {
        Self {
            buf: None,
            capacity,
        }
    }

    /// Pushes given data.
    ///
    /// If the internal buffer is empty, it will be initialized with the shape
    /// `[capacity, data.buf.dims()[1..]]`.
    fn push(&mut self, index: usize, data: Self) -> Result<()> {
        let data = match data.buf {
            Some(data) => data.to_device(&Device::Cpu)?,
            None => return Ok(()),
        };
        let batch_size = data.dim(0)?;
        if batch_size == 0 {
            return Ok(());
        }
        if batch_size > self.capacity {
            bail!(
                "Cannot push {} items into a buffer of capacity {}",
                batch_size,
                self.capacity
            );
        }

        if self.buf.is_none() {
            let mut shape = data.dims().to_vec();
            shape[0] = self.capacity;
            self.buf = Some(Tensor::zeros(shape, data.dtype(), &Device::Cpu)?);
        }

        if let Some(buf) = self.buf.as_ref() {
            let index = index % self.capacity;
            if index + batch_size > self.capacity {
                let n1 = self.capacity - index;
                buf.slice_set(&data.narrow(0, 0, n1)?, 0, index)?;
                buf.slice_set(&data.narrow(0, n1, batch_size - n1)?, 0, 0)?;
            } else {
                buf.slice_set(&data, 0, index)?;
            }
        }

        Ok(())
    }

    fn sample(&self, ixs: &[usize]) -> Result<Self> {
        let buf = self.buf.as_ref().context("Sampling from an empty TensorBatch")?;
        let capacity = ixs.len();
        let ixs = {
            let ixs: Vec<u32> = ixs.iter().map(|x| *x as u32).collect();
            Tensor::from_vec(ixs, (capacity,), buf.device())?
        };
        let buf = Some(buf.index_select(&ixs, 0)?);
        Ok(Self { buf, capacity })
    }
}

impl TryFrom<TensorBatch> for Tensor {
    type Error = anyhow::Error;

    fn try_from(b: TensorBatch) -> Result<Self> {
        b.buf.context("TensorBatch holds no data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(v: f32) -> Result<TensorBatch> {
        let t = Tensor::from_slice(&[v, v + 0.5], (1, 2), &Device::Cpu)?;
        Ok(TensorBatch::from_tensor(t))
    }

    #[test]
    fn test_push_wraps_around() -> Result<()> {
        let mut batch = TensorBatch::new(3);
        for i in 0..4 {
            batch.push(i, row(i as f32)?)?;
        }
        let t: Tensor = batch.try_into()?;
        let t: Vec<Vec<f32>> = t.to_vec2()?;
        assert_eq!(t, vec![vec![3.0, 3.5], vec![1.0, 1.5], vec![2.0, 2.5]]);
        Ok(())
    }

    #[test]
    fn test_push_split_at_the_end() -> Result<()> {
        let mut batch = TensorBatch::new(3);
        let t = Tensor::from_slice(&[1f32, 2., 3., 4.], (2, 2), &Device::Cpu)?;
        batch.push(2, TensorBatch::from_tensor(t))?;
        let t: Vec<Vec<f32>> = Tensor::try_from(batch)?.to_vec2()?;
        assert_eq!(t, vec![vec![3.0, 4.0], vec![0.0, 0.0], vec![1.0, 2.0]]);
        Ok(())
    }

    #[test]
    fn test_sample() -> Result<()> {
        let mut batch = TensorBatch::new(4);
        for i in 0..4 {
            batch.push(i, row(i as f32)?)?;
        }
        let sampled = batch.sample(&[3, 0])?;
        let t: Vec<Vec<f32>> = Tensor::try_from(sampled)?.to_vec2()?;
        assert_eq!(t, vec![vec![3.0, 3.5], vec![0.0, 0.5]]);

        assert!(TensorBatch::new(4).sample(&[0]).is_err());
        Ok(())
    }
}
